//! Facade re-exports and settings wiring

use kapwa::prelude::*;
use rstest::rstest;
use serde_json::json;
use std::sync::Arc;

#[rstest]
fn test_renderer_from_default_settings() {
	// Arrange
	let settings = PageBuilderSettings::default();
	let registry = Arc::new(BlockRegistry::with_builtin_blocks());
	let mut editor = DocumentEditor::with_settings(PageDocument::new("Home"), registry.clone(), &settings.editor);
	let id = editor.insert_block(0, "announcement_banner").unwrap();
	editor.edit_field(&id, "type", json!("warning"));

	// Act
	let renderer = PageRenderer::from_settings(registry, &settings).unwrap();
	let html = renderer.render_to_html(&editor.document().blocks, Audience::Public);

	// Assert
	assert!(html.starts_with(r#"<div class="kapwa-blocks">"#));
	assert!(html.contains(r#"role="alert""#));
	assert!(html.contains("Important announcement here"));
}

#[rstest]
#[case("<p>hi</p><script>alert(1)</script>", "<p>hi</p>")]
#[case("<p onclick=\"x()\">a</p>", "<p>a</p>")]
fn test_sanitize_html_reexport(#[case] input: &str, #[case] expected: &str) {
	assert_eq!(sanitize_html(input), expected);
	assert_eq!(sanitize_html(&sanitize_html(input)), expected);
}

#[tokio::test]
async fn test_prelude_covers_save_flow() {
	let store = Arc::new(MemoryPageStore::new());
	let page = store.insert_page(PageType::Home, PageDocument::new("Home")).unwrap();
	let coordinator = SaveCoordinator::new(store.clone(), page.id);
	let mut editor = DocumentEditor::new(page.document.clone(), kapwa::global_registry());
	editor.insert_block(0, "hero");

	let outcome = editor.save(&coordinator).await.unwrap();

	assert!(matches!(outcome, SaveOutcome::Saved { ref record, .. } if record.document.blocks.len() == 1));
	assert!(!editor.is_dirty());
}
