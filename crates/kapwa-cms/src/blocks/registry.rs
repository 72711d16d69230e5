//! Block type registry
//!
//! Populated once at startup, then shared read-only behind an `Arc`.

use super::{BlockCategory, BlockTypeDescriptor, builtin};
use crate::error::{CmsError, CmsResult};
use crate::schema::validate_schema;
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::{debug, info};

/// Process-wide registry, installed by [`init_global_registry`]
static GLOBAL_REGISTRY: OnceCell<Arc<BlockRegistry>> = OnceCell::new();

/// Registered block types in registration order
#[derive(Debug, Default, Clone)]
pub struct BlockRegistry {
	types: IndexMap<String, Arc<BlockTypeDescriptor>>,
}

impl BlockRegistry {
	/// Empty registry
	pub fn new() -> Self {
		Self::default()
	}

	/// Registry holding the six builtin block types
	///
	/// # Examples
	///
	/// ```
	/// use kapwa_cms::blocks::{BlockCategory, BlockRegistry};
	///
	/// let registry = BlockRegistry::with_builtin_blocks();
	/// assert_eq!(registry.len(), 6);
	/// assert_eq!(registry.lookup("hero").unwrap().category, BlockCategory::Layout);
	/// assert!(registry.lookup("carousel").is_none());
	/// ```
	pub fn with_builtin_blocks() -> Self {
		let mut registry = Self::new();
		for descriptor in builtin::descriptors() {
			// Builtin schemas are fixed and valid, ids are distinct
			if let Err(error) = registry.register(descriptor) {
				tracing::error!(error = %error, "Failed to register builtin block type");
			}
		}
		registry
	}

	/// Register a block type
	///
	/// Fails when the type id is taken or the field schema is one the
	/// property editor cannot honour.
	pub fn register(&mut self, descriptor: BlockTypeDescriptor) -> CmsResult<()> {
		if self.types.contains_key(&descriptor.type_id) {
			return Err(CmsError::DuplicateBlockType(descriptor.type_id));
		}
		validate_schema(&descriptor.field_schema).map_err(|violation| CmsError::InvalidSchema {
			block_type: descriptor.type_id.clone(),
			field: violation.field,
			reason: violation.reason,
		})?;

		debug!(
			block_type = %descriptor.type_id,
			category = %descriptor.category,
			fields = descriptor.field_schema.len(),
			"Registered block type"
		);
		self.types
			.insert(descriptor.type_id.clone(), Arc::new(descriptor));
		Ok(())
	}

	/// Descriptor for `type_id`
	pub fn lookup(&self, type_id: &str) -> Option<&BlockTypeDescriptor> {
		self.types.get(type_id).map(Arc::as_ref)
	}

	/// Whether `type_id` is registered
	pub fn is_registered(&self, type_id: &str) -> bool {
		self.types.contains_key(type_id)
	}

	/// Descriptors of one category, in registration order
	pub fn list_by_category(&self, category: BlockCategory) -> Vec<&BlockTypeDescriptor> {
		self.iter()
			.filter(|descriptor| descriptor.category == category)
			.collect()
	}

	/// Every registered type id, in registration order
	pub fn all_types(&self) -> Vec<&str> {
		self.types.keys().map(String::as_str).collect()
	}

	/// Every descriptor, in registration order
	pub fn iter(&self) -> impl Iterator<Item = &BlockTypeDescriptor> {
		self.types.values().map(Arc::as_ref)
	}

	/// Number of registered types
	pub fn len(&self) -> usize {
		self.types.len()
	}

	/// Whether nothing is registered
	pub fn is_empty(&self) -> bool {
		self.types.is_empty()
	}
}

/// Install the process-wide registry
///
/// May be called once. Later calls fail with
/// [`CmsError::RegistryAlreadyInitialized`] and leave the installed
/// registry untouched.
pub fn init_global_registry(registry: BlockRegistry) -> CmsResult<Arc<BlockRegistry>> {
	let registry = Arc::new(registry);
	GLOBAL_REGISTRY
		.set(registry.clone())
		.map_err(|_| CmsError::RegistryAlreadyInitialized)?;
	info!(types = registry.len(), "Block registry initialized");
	Ok(registry)
}

/// The process-wide registry
///
/// Falls back to the builtin block types when none was installed.
pub fn global_registry() -> Arc<BlockRegistry> {
	GLOBAL_REGISTRY
		.get_or_init(|| Arc::new(BlockRegistry::with_builtin_blocks()))
		.clone()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::blocks::{BlockContext, RenderError};
	use crate::schema::FieldSchema;
	use serde_json::Value;

	fn noop(_: &BlockContext<'_>) -> Result<String, RenderError> {
		Ok(String::new())
	}

	#[test]
	fn test_register_and_lookup() {
		// Arrange
		let mut registry = BlockRegistry::new();
		let descriptor = BlockTypeDescriptor::new("note", "Note", BlockCategory::Utility, noop);

		// Act
		registry.register(descriptor).unwrap();

		// Assert
		assert!(registry.is_registered("note"));
		assert_eq!(registry.lookup("note").unwrap().display_name, "Note");
		assert_eq!(registry.all_types(), vec!["note"]);
	}

	#[test]
	fn test_duplicate_registration_rejected() {
		let mut registry = BlockRegistry::new();
		registry
			.register(BlockTypeDescriptor::new("note", "Note", BlockCategory::Utility, noop))
			.unwrap();

		let result = registry.register(BlockTypeDescriptor::new("note", "Other", BlockCategory::Content, noop));

		assert!(matches!(result, Err(CmsError::DuplicateBlockType(id)) if id == "note"));
		assert_eq!(registry.lookup("note").unwrap().display_name, "Note");
	}

	#[test]
	fn test_invalid_schema_rejected() {
		let mut registry = BlockRegistry::new();
		let descriptor = BlockTypeDescriptor::new("bad", "Bad", BlockCategory::Utility, noop)
			.with_field("list", FieldSchema::array("List", None, Value::from(3)));

		let result = registry.register(descriptor);

		assert!(matches!(result, Err(CmsError::InvalidSchema { field, .. }) if field == "list"));
		assert!(registry.is_empty());
	}

	#[test]
	fn test_builtin_categories() {
		let registry = BlockRegistry::with_builtin_blocks();

		let layout: Vec<_> = registry
			.list_by_category(BlockCategory::Layout)
			.iter()
			.map(|d| d.type_id.as_str())
			.collect();

		assert_eq!(layout, vec!["hero", "card_grid", "announcement_banner"]);
		assert!(registry.list_by_category(BlockCategory::Utility).is_empty());
	}

	#[test]
	fn test_global_registry_defaults_to_builtins() {
		assert!(global_registry().is_registered("hero"));
	}
}
