//! Block picker shown when adding a block

use crate::blocks::{BlockCategory, BlockRegistry, BlockTypeDescriptor};
use kapwa_core::security::{escape_html, escape_html_attr};

/// Registered block types of one category
#[derive(Debug)]
pub struct PickerGroup<'a> {
	/// Category of every block in the group
	pub category: BlockCategory,
	/// Descriptors in registration order
	pub blocks: Vec<&'a BlockTypeDescriptor>,
}

/// Groups and searches the registered block types
pub struct BlockPicker<'a> {
	registry: &'a BlockRegistry,
}

impl<'a> BlockPicker<'a> {
	/// Picker over `registry`
	pub fn new(registry: &'a BlockRegistry) -> Self {
		Self { registry }
	}

	/// Every non-empty category group, in category order
	pub fn groups(&self) -> Vec<PickerGroup<'a>> {
		self.search("", None)
	}

	/// Groups filtered by a case-insensitive query over display name and
	/// description, optionally restricted to one category
	///
	/// # Examples
	///
	/// ```
	/// use kapwa_cms::admin::BlockPicker;
	/// use kapwa_cms::blocks::{BlockCategory, BlockRegistry};
	///
	/// let registry = BlockRegistry::with_builtin_blocks();
	/// let picker = BlockPicker::new(&registry);
	///
	/// let groups = picker.search("CARD", None);
	/// assert_eq!(groups.len(), 1);
	/// assert_eq!(groups[0].category, BlockCategory::Layout);
	/// assert_eq!(groups[0].blocks[0].type_id, "card_grid");
	/// ```
	pub fn search(&self, query: &str, category: Option<BlockCategory>) -> Vec<PickerGroup<'a>> {
		let needle = query.trim().to_lowercase();
		let registry = self.registry;
		BlockCategory::ALL
			.iter()
			.filter(|candidate| category.is_none_or(|wanted| wanted == **candidate))
			.map(|candidate| PickerGroup {
				category: *candidate,
				blocks: registry
					.list_by_category(*candidate)
					.into_iter()
					.filter(|descriptor| matches_query(descriptor, &needle))
					.collect(),
			})
			.filter(|group| !group.blocks.is_empty())
			.collect()
	}

	/// Picker markup for the groups matching `query`
	pub fn render_html(&self, query: &str) -> String {
		let groups = self.search(query, None);
		if groups.is_empty() {
			return concat!(
				r#"<div class="kapwa-block-picker kapwa-block-picker--empty">"#,
				"<p>No blocks found</p><p>Try adjusting your search or filter</p></div>"
			)
			.to_string();
		}

		let mut html = String::from(r#"<div class="kapwa-block-picker">"#);
		for group in groups {
			html.push_str(&format!(
				r#"<section class="kapwa-block-picker__group" data-category="{}"><h3>{}</h3><p>{}</p><ul>"#,
				group.category,
				group.category.label(),
				group.category.description()
			));
			for descriptor in group.blocks {
				html.push_str(&format!(
					r#"<li><button type="button" data-block-type="{}" data-icon="{}"><strong>{}</strong><span>{}</span></button></li>"#,
					escape_html_attr(&descriptor.type_id),
					escape_html_attr(&descriptor.icon),
					escape_html(&descriptor.display_name),
					escape_html(&descriptor.description)
				));
			}
			html.push_str("</ul></section>");
		}
		html.push_str("</div>");
		html
	}
}

fn matches_query(descriptor: &BlockTypeDescriptor, needle: &str) -> bool {
	needle.is_empty()
		|| descriptor.display_name.to_lowercase().contains(needle)
		|| descriptor.description.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[test]
	fn test_groups_follow_category_order() {
		// Arrange
		let registry = BlockRegistry::with_builtin_blocks();

		// Act
		let groups = BlockPicker::new(&registry).groups();

		// Assert
		let categories: Vec<_> = groups.iter().map(|g| g.category).collect();
		assert_eq!(
			categories,
			vec![BlockCategory::Layout, BlockCategory::Content, BlockCategory::Interactive]
		);
		let total: usize = groups.iter().map(|g| g.blocks.len()).sum();
		assert_eq!(total, registry.len());
	}

	#[rstest]
	#[case("", None, 6)]
	#[case("live feed", None, 1)]
	#[case("  numbered ", None, 1)]
	#[case("", Some(BlockCategory::Content), 2)]
	#[case("hero", Some(BlockCategory::Content), 0)]
	#[case("nothing matches this", None, 0)]
	fn test_search(#[case] query: &str, #[case] category: Option<BlockCategory>, #[case] expected: usize) {
		let registry = BlockRegistry::with_builtin_blocks();

		let found: usize = BlockPicker::new(&registry)
			.search(query, category)
			.iter()
			.map(|g| g.blocks.len())
			.sum();

		assert_eq!(found, expected);
	}

	#[test]
	fn test_render_html_empty_state() {
		let registry = BlockRegistry::with_builtin_blocks();

		let html = BlockPicker::new(&registry).render_html("zzz");

		assert!(html.contains("No blocks found"));
	}

	#[test]
	fn test_render_html_lists_blocks() {
		let registry = BlockRegistry::with_builtin_blocks();

		let html = BlockPicker::new(&registry).render_html("");

		assert!(html.contains(r#"data-block-type="needs_widget" data-icon="volunteer_activism""#));
		assert!(html.contains("<h3>Interactive</h3><p>Engage visitors with dynamic content</p>"));
	}
}
