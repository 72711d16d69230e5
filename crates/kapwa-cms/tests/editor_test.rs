//! Document editor workflows

use kapwa_cms::blocks::{Block, BlockRegistry, Props};
use kapwa_cms::editor::{DocumentEditor, DragState, ViewMode};
use kapwa_cms::pages::{PageDocument, PageStatus};
use kapwa_conf::EditorSettings;
use rstest::{fixture, rstest};
use serde_json::json;
use std::sync::Arc;

#[fixture]
fn registry() -> Arc<BlockRegistry> {
	Arc::new(BlockRegistry::with_builtin_blocks())
}

fn abc_editor(registry: Arc<BlockRegistry>) -> DocumentEditor {
	let document = PageDocument::new("Home").with_blocks(vec![
		Block::with_id("A", "hero", Props::new()),
		Block::with_id("B", "steps", Props::new()),
		Block::with_id("C", "rich_text_section", Props::new()),
	]);
	DocumentEditor::new(document, registry)
}

fn order(editor: &DocumentEditor) -> Vec<&str> {
	editor.document().blocks.iter().map(|b| b.id.as_str()).collect()
}

#[rstest]
fn test_insert_into_empty_document_uses_defaults(registry: Arc<BlockRegistry>) {
	// Arrange
	let mut editor = DocumentEditor::new(PageDocument::new("Home"), registry.clone());

	// Act
	let id = editor.insert_block(0, "hero").unwrap();

	// Assert
	let blocks = &editor.document().blocks;
	assert_eq!(blocks.len(), 1);
	assert_eq!(blocks[0].id, id);
	assert_eq!(blocks[0].block_type, "hero");
	assert_eq!(blocks[0].props, registry.lookup("hero").unwrap().default_props);
	assert!(editor.is_dirty());
}

#[rstest]
fn test_move_first_block_to_end(registry: Arc<BlockRegistry>) {
	let mut editor = abc_editor(registry);

	assert!(editor.move_block(0, 2));

	assert_eq!(order(&editor), vec!["B", "C", "A"]);
}

#[rstest]
fn test_delete_missing_block_leaves_document_untouched(registry: Arc<BlockRegistry>) {
	// Arrange
	let mut editor = abc_editor(registry);
	let before = editor.snapshot();

	// Act
	let deleted = editor.delete_block("missing");

	// Assert
	assert!(!deleted);
	assert_eq!(*editor.snapshot(), *before);
	assert!(Arc::ptr_eq(&editor.snapshot(), &before));
	assert!(!editor.is_dirty());
}

#[rstest]
fn test_every_change_produces_a_new_document(registry: Arc<BlockRegistry>) {
	let mut editor = abc_editor(registry);
	let first = editor.snapshot();

	editor.update_props("B", json!({"heading": "Join"}).as_object().unwrap().clone());

	let second = editor.snapshot();
	assert!(!Arc::ptr_eq(&first, &second));
	assert_eq!(first.blocks[1].props, Props::new());
	assert_eq!(second.blocks[1].props["heading"], json!("Join"));
}

#[rstest]
fn test_drag_reorder_commits_on_end(registry: Arc<BlockRegistry>) {
	// Arrange
	let mut editor = abc_editor(registry);

	// Act
	editor.drag_start(2);
	editor.drag_over(2);
	assert_eq!(editor.drag_state(), DragState::Dragging { source: 2 });
	editor.drag_over(0);
	let moved = editor.drag_end();

	// Assert
	assert!(moved);
	assert_eq!(order(&editor), vec!["C", "A", "B"]);
	assert_eq!(editor.drag_state(), DragState::Idle);
}

#[rstest]
fn test_drag_without_target_does_nothing(registry: Arc<BlockRegistry>) {
	let mut editor = abc_editor(registry);

	editor.drag_start(1);
	let moved = editor.drag_end();

	assert!(!moved);
	assert_eq!(order(&editor), vec!["A", "B", "C"]);
	assert!(!editor.is_dirty());
}

#[rstest]
fn test_drag_cancel_discards_target(registry: Arc<BlockRegistry>) {
	let mut editor = abc_editor(registry);

	editor.drag_start(0);
	editor.drag_over(1);
	editor.drag_cancel();

	assert!(!editor.drag_end());
	assert_eq!(order(&editor), vec!["A", "B", "C"]);
}

#[rstest]
fn test_drag_over_without_start_is_ignored(registry: Arc<BlockRegistry>) {
	let mut editor = abc_editor(registry);

	editor.drag_over(1);

	assert_eq!(editor.drag_state(), DragState::Idle);
}

#[rstest]
fn test_insert_unknown_type_is_rejected(registry: Arc<BlockRegistry>) {
	let mut editor = abc_editor(registry);
	let before = editor.snapshot();

	assert_eq!(editor.insert_block(1, "carousel"), None);

	assert!(Arc::ptr_eq(&before, &editor.snapshot()));
	assert_eq!(editor.revision(), 0);
}

#[rstest]
fn test_deleting_selected_block_clears_selection(registry: Arc<BlockRegistry>) {
	let mut editor = abc_editor(registry);
	editor.select_block(Some("B"));

	editor.delete_block("B");

	assert_eq!(editor.selected(), None);
	assert_eq!(order(&editor), vec!["A", "C"]);
}

#[rstest]
fn test_property_editor_only_in_edit_mode(registry: Arc<BlockRegistry>) {
	let mut editor = abc_editor(registry);
	editor.select_block(Some("A"));
	assert!(editor.property_editor().is_some());

	editor.set_view_mode(ViewMode::Preview);

	assert!(editor.property_editor().is_none());
	assert_eq!(editor.selected(), Some("A"));
}

#[rstest]
fn test_edit_field_coerces_through_schema(registry: Arc<BlockRegistry>) {
	let mut editor = DocumentEditor::new(PageDocument::new("Home"), registry);
	let id = editor.insert_block(0, "needs_widget").unwrap();

	assert!(editor.edit_field(&id, "limit", json!("99")));

	assert_eq!(editor.document().block(&id).unwrap().props["limit"], json!(12));
}

#[rstest]
fn test_undo_redo_round_trip(registry: Arc<BlockRegistry>) {
	// Arrange
	let mut editor = abc_editor(registry);
	editor.move_block(0, 2);
	editor.set_status(PageStatus::Archived);

	// Act
	assert!(editor.undo());
	assert!(editor.undo());
	let undone = order(&editor).join(",");
	assert!(editor.redo());

	// Assert
	assert_eq!(undone, "A,B,C");
	assert_eq!(order(&editor), vec!["B", "C", "A"]);
	assert_eq!(editor.document().status, PageStatus::Draft);
	assert!(editor.can_redo());
}

#[rstest]
fn test_history_limit_bounds_undo(registry: Arc<BlockRegistry>) {
	let settings = EditorSettings {
		history_limit: 2,
		preview_length: 40,
	};
	let mut editor = DocumentEditor::with_settings(PageDocument::new("Home"), registry, &settings);

	for _ in 0..5 {
		editor.insert_block(0, "steps");
	}

	assert!(editor.undo());
	assert!(editor.undo());
	assert!(!editor.undo());
	assert_eq!(editor.document().blocks.len(), 3);
}

#[rstest]
fn test_block_cards_describe_document(registry: Arc<BlockRegistry>) {
	// Arrange
	let document = PageDocument::new("Home").with_blocks(vec![
		Block::with_id("h", "hero", json!({"headline": "Hi"}).as_object().unwrap().clone()),
		Block::with_id("x", "legacy", Props::new()),
	]);
	let mut editor = DocumentEditor::new(document, registry);
	editor.select_block(Some("x"));

	// Act
	let cards = editor.block_cards();

	// Assert
	assert_eq!(cards.len(), 2);
	assert_eq!(cards[0].display_name, "Hero Section");
	assert_eq!(cards[0].preview, "Hi");
	assert!(!cards[0].can_move_up);
	assert!(cards[0].can_move_down);
	assert!(!cards[1].registered);
	assert!(cards[1].selected);
	assert!(!cards[1].can_move_down);
}
