//! Page documents, stored page records and page templates

use crate::blocks::{Block, BlockRegistry, new_block_id};
use chrono::{DateTime, Utc};
use kapwa_core::text::slugify;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Publication status of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
	/// Not visible to the public
	#[default]
	Draft,
	/// Live
	Published,
	/// Retired
	Archived,
}

impl fmt::Display for PageStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Draft => "draft",
			Self::Published => "published",
			Self::Archived => "archived",
		})
	}
}

/// Kind of page a record or template represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
	/// Landing page
	Home,
	/// About page
	About,
	/// Programs page
	Programs,
	/// Contact page
	Contact,
	/// Anything else
	#[default]
	Custom,
}

/// The document edited by the page builder
///
/// Blocks render in order, index 0 first. Block ids are unique within a
/// document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageDocument {
	/// Page title
	pub title: String,
	/// URL slug
	pub slug: String,
	/// Publication status
	#[serde(default)]
	pub status: PageStatus,
	/// Ordered blocks
	#[serde(rename = "blocks_json", default)]
	pub blocks: Vec<Block>,
}

impl PageDocument {
	/// Empty draft with a slug derived from the title
	///
	/// # Examples
	///
	/// ```
	/// use kapwa_cms::pages::{PageDocument, PageStatus};
	///
	/// let page = PageDocument::new("About Us");
	/// assert_eq!(page.slug, "about-us");
	/// assert_eq!(page.status, PageStatus::Draft);
	/// assert!(page.blocks.is_empty());
	/// ```
	pub fn new(title: impl Into<String>) -> Self {
		let title = title.into();
		Self {
			slug: slugify(&title),
			title,
			status: PageStatus::Draft,
			blocks: Vec::new(),
		}
	}

	/// Replace the blocks
	pub fn with_blocks(mut self, blocks: Vec<Block>) -> Self {
		self.blocks = blocks;
		self
	}

	/// Position of the block with `id`
	pub fn block_index(&self, id: &str) -> Option<usize> {
		self.blocks.iter().position(|block| block.id == id)
	}

	/// Block with `id`
	pub fn block(&self, id: &str) -> Option<&Block> {
		self.blocks.iter().find(|block| block.id == id)
	}

	/// Whether no two blocks share an id
	pub fn has_unique_ids(&self) -> bool {
		let mut seen = HashSet::with_capacity(self.blocks.len());
		self.blocks.iter().all(|block| seen.insert(block.id.as_str()))
	}

	/// Type ids used in the document that `registry` does not know, in first-use order
	pub fn unknown_block_types(&self, registry: &BlockRegistry) -> Vec<String> {
		let mut unknown: Vec<String> = Vec::new();
		for block in &self.blocks {
			if !registry.is_registered(&block.block_type) && !unknown.contains(&block.block_type) {
				unknown.push(block.block_type.clone());
			}
		}
		unknown
	}
}

/// A page as held by the persistence collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
	/// Page id
	pub id: Uuid,
	/// Kind of page
	#[serde(default)]
	pub page_type: PageType,
	/// Template the page was created from
	#[serde(default)]
	pub source_template: Option<String>,
	/// Editable content
	#[serde(flatten)]
	pub document: PageDocument,
	/// Creation time
	pub created_at: DateTime<Utc>,
	/// Last update time
	pub updated_at: DateTime<Utc>,
}

impl PageRecord {
	/// Fresh record around a document
	pub fn new(page_type: PageType, document: PageDocument) -> Self {
		let now = Utc::now();
		Self {
			id: Uuid::new_v4(),
			page_type,
			source_template: None,
			document,
			created_at: now,
			updated_at: now,
		}
	}
}

/// Payload of a page update
///
/// Always the full editable state of the page, never a patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageUpdate {
	/// Page title
	pub title: String,
	/// URL slug
	pub slug: String,
	/// Publication status
	pub status: PageStatus,
	/// Ordered blocks
	#[serde(rename = "blocks_json")]
	pub blocks: Vec<Block>,
}

impl From<&PageDocument> for PageUpdate {
	fn from(document: &PageDocument) -> Self {
		Self {
			title: document.title.clone(),
			slug: document.slug.clone(),
			status: document.status,
			blocks: document.blocks.clone(),
		}
	}
}

impl From<PageUpdate> for PageDocument {
	fn from(update: PageUpdate) -> Self {
		Self {
			title: update.title,
			slug: update.slug,
			status: update.status,
			blocks: update.blocks,
		}
	}
}

/// Optional values applied when creating a page from a template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageOverrides {
	/// Title, the template name when absent
	#[serde(default)]
	pub title: Option<String>,
	/// Slug, derived from the title when absent
	#[serde(default)]
	pub slug: Option<String>,
}

/// Grouping of templates in the template library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateCategory {
	/// Starter templates
	#[default]
	Starter,
	/// Community organization
	Community,
	/// Nonprofit or charity
	Nonprofit,
	/// Mutual aid group
	MutualAid,
}

/// Pre-built page a new page can be cloned from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageTemplate {
	/// Template id, such as `home-starter`
	pub id: String,
	/// Display name
	pub name: String,
	/// What the template is for
	#[serde(default)]
	pub description: String,
	/// Kind of page it creates
	#[serde(default)]
	pub page_type: PageType,
	/// Library grouping
	#[serde(default)]
	pub category: TemplateCategory,
	/// Blocks copied into new pages
	#[serde(rename = "blocks_json", default)]
	pub blocks: Vec<Block>,
}

impl PageTemplate {
	/// Deep copy of the template blocks, each with a fresh id
	pub fn clone_blocks(&self) -> Vec<Block> {
		self.blocks
			.iter()
			.map(|block| Block {
				id: new_block_id(),
				..block.clone()
			})
			.collect()
	}

	/// Draft document built from this template
	///
	/// # Examples
	///
	/// ```
	/// use kapwa_cms::pages::{PageOverrides, starter_templates};
	///
	/// let template = &starter_templates()[0];
	/// let page = template.create_document(&PageOverrides {
	///     title: Some("Welcome".to_string()),
	///     slug: None,
	/// });
	/// assert_eq!(page.slug, "welcome");
	/// assert_eq!(page.blocks.len(), template.blocks.len());
	/// assert_ne!(page.blocks[0].id, template.blocks[0].id);
	/// ```
	pub fn create_document(&self, overrides: &PageOverrides) -> PageDocument {
		let title = overrides
			.title
			.clone()
			.filter(|title| !title.trim().is_empty())
			.unwrap_or_else(|| self.name.clone());
		let slug = overrides
			.slug
			.clone()
			.filter(|slug| !slug.trim().is_empty())
			.unwrap_or_else(|| slugify(&title));
		PageDocument {
			title,
			slug,
			status: PageStatus::Draft,
			blocks: self.clone_blocks(),
		}
	}
}

/// Templates shipped with the builtin block types
pub fn starter_templates() -> Vec<PageTemplate> {
	let block = |id: &str, block_type: &str, props: serde_json::Value| {
		Block::with_id(id, block_type, props.as_object().cloned().unwrap_or_default())
	};

	vec![
		PageTemplate {
			id: "home-starter".to_string(),
			name: "Home - Starter".to_string(),
			description: "A welcoming home page with hero, cards, and call-to-action sections.".to_string(),
			page_type: PageType::Home,
			category: TemplateCategory::Starter,
			blocks: vec![
				block(
					"hero-1",
					"hero",
					json!({
						"headline": "Welcome to Our Community",
						"subheadline": "Together, we build connections that matter. Join us in making a difference.",
						"alignment": "center",
						"ctas": [
							{"label": "Get Involved", "href": "/join", "variant": "primary"},
							{"label": "Learn More", "href": "/about", "variant": "secondary"}
						]
					}),
				),
				block(
					"cards-1",
					"card_grid",
					json!({
						"heading": "How We Help",
						"columns": 3,
						"cards": [
							{"title": "Mutual Aid", "description": "Connect with neighbors to give and receive help with everyday needs."},
							{"title": "Item Sharing", "description": "Share food, clothing, and essentials with those who need them."},
							{"title": "Community Events", "description": "Join gatherings, workshops, and celebrations that bring us together."}
						]
					}),
				),
				block(
					"needs-1",
					"needs_widget",
					json!({"heading": "Community Needs", "showType": "both", "limit": 6}),
				),
			],
		},
		PageTemplate {
			id: "about-mutual-aid".to_string(),
			name: "About - Mutual Aid".to_string(),
			description: "Explain how your mutual aid group works, step by step.".to_string(),
			page_type: PageType::About,
			category: TemplateCategory::MutualAid,
			blocks: vec![
				block(
					"intro-1",
					"rich_text_section",
					json!({"content": "<h2>Who We Are</h2><p>We are neighbors helping neighbors.</p>"}),
				),
				block(
					"steps-1",
					"steps",
					json!({
						"heading": "How It Works",
						"steps": [
							{"number": 1, "title": "Join", "description": "Create your free account."},
							{"number": 2, "title": "Share", "description": "Post what you need or can offer."},
							{"number": 3, "title": "Connect", "description": "Meet neighbors and exchange help."}
						]
					}),
				),
			],
		},
	]
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::blocks::Props;
	use rstest::rstest;

	fn block(id: &str, block_type: &str) -> Block {
		Block::with_id(id, block_type, Props::new())
	}

	#[test]
	fn test_document_wire_shape() {
		// Arrange
		let document = PageDocument::new("Home").with_blocks(vec![block("a", "hero")]);

		// Act
		let value = serde_json::to_value(&document).unwrap();

		// Assert
		assert_eq!(
			value,
			json!({
				"title": "Home",
				"slug": "home",
				"status": "draft",
				"blocks_json": [{"id": "a", "type": "hero", "props": {}}]
			})
		);
	}

	#[test]
	fn test_unique_ids() {
		let ok = PageDocument::new("x").with_blocks(vec![block("a", "hero"), block("b", "hero")]);
		let dup = PageDocument::new("x").with_blocks(vec![block("a", "hero"), block("a", "steps")]);

		assert!(ok.has_unique_ids());
		assert!(!dup.has_unique_ids());
	}

	#[test]
	fn test_unknown_block_types_deduplicated() {
		let registry = BlockRegistry::with_builtin_blocks();
		let document = PageDocument::new("x").with_blocks(vec![
			block("a", "stats_strip"),
			block("b", "hero"),
			block("c", "stats_strip"),
			block("d", "faq_accordion"),
		]);

		assert_eq!(document.unknown_block_types(&registry), vec!["stats_strip", "faq_accordion"]);
	}

	#[test]
	fn test_record_flattens_document() {
		let record = PageRecord::new(PageType::About, PageDocument::new("About"));

		let value = serde_json::to_value(&record).unwrap();

		assert_eq!(value["page_type"], "about");
		assert_eq!(value["slug"], "about");
		assert!(value["blocks_json"].is_array());
		let back: PageRecord = serde_json::from_value(value).unwrap();
		assert_eq!(back, record);
	}

	#[rstest]
	#[case(None, None, "Home - Starter", "home-starter")]
	#[case(Some("Our Home"), None, "Our Home", "our-home")]
	#[case(Some("Our Home"), Some("start"), "Our Home", "start")]
	#[case(Some("  "), Some(""), "Home - Starter", "home-starter")]
	fn test_create_document_overrides(
		#[case] title: Option<&str>,
		#[case] slug: Option<&str>,
		#[case] expected_title: &str,
		#[case] expected_slug: &str,
	) {
		// Arrange
		let template = &starter_templates()[0];
		let overrides = PageOverrides {
			title: title.map(str::to_string),
			slug: slug.map(str::to_string),
		};

		// Act
		let document = template.create_document(&overrides);

		// Assert
		assert_eq!(document.title, expected_title);
		assert_eq!(document.slug, expected_slug);
		assert_eq!(document.status, PageStatus::Draft);
	}

	#[test]
	fn test_clone_blocks_mints_fresh_ids() {
		let template = &starter_templates()[0];

		let first = template.clone_blocks();
		let second = template.clone_blocks();

		for ((original, a), b) in template.blocks.iter().zip(&first).zip(&second) {
			assert_ne!(original.id, a.id);
			assert_ne!(a.id, b.id);
			assert_eq!(original.props, a.props);
		}
	}

	#[test]
	fn test_starter_templates_use_registered_types() {
		let registry = BlockRegistry::with_builtin_blocks();

		for template in starter_templates() {
			let document = template.create_document(&PageOverrides::default());
			assert!(document.unknown_block_types(&registry).is_empty(), "{}", template.id);
			assert!(document.has_unique_ids());
		}
	}
}
