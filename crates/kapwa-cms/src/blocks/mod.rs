//! Content blocks
//!
//! A [`Block`] is one unit of page content: a stable id, a type id and an
//! opaque property bag. What a type id means is defined by its
//! [`BlockTypeDescriptor`], registered once in a [`BlockRegistry`].

pub mod builtin;
mod props;
mod registry;

pub use props::PropAccess;
pub use registry::{BlockRegistry, global_registry, init_global_registry};

use crate::schema::{FieldSchema, SchemaMap};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Block identifier, unique within a document
pub type BlockId = String;

/// Property bag of a block, in insertion order
pub type Props = Map<String, Value>;

/// Mint a fresh block id
pub fn new_block_id() -> BlockId {
	Uuid::new_v4().to_string()
}

/// A block instance in a page document
///
/// Serialized as `{"id": ..., "type": ..., "props": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
	/// Stable id
	pub id: BlockId,

	/// Registered type id
	#[serde(rename = "type")]
	pub block_type: String,

	/// Property bag
	#[serde(default)]
	pub props: Props,
}

impl Block {
	/// Block with a freshly minted id
	pub fn new(block_type: impl Into<String>, props: Props) -> Self {
		Self::with_id(new_block_id(), block_type, props)
	}

	/// Block with a known id
	pub fn with_id(id: impl Into<BlockId>, block_type: impl Into<String>, props: Props) -> Self {
		Self {
			id: id.into(),
			block_type: block_type.into(),
			props,
		}
	}
}

/// Block category, used to group the block picker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockCategory {
	/// Page structure
	Layout,
	/// Text and media
	Content,
	/// Live or input-driven widgets
	Interactive,
	/// Everything else
	Utility,
}

impl BlockCategory {
	/// Every category in display order
	pub const ALL: [BlockCategory; 4] = [
		BlockCategory::Layout,
		BlockCategory::Content,
		BlockCategory::Interactive,
		BlockCategory::Utility,
	];

	/// Serialized name
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Layout => "layout",
			Self::Content => "content",
			Self::Interactive => "interactive",
			Self::Utility => "utility",
		}
	}

	/// Heading shown in the block picker
	pub fn label(&self) -> &'static str {
		match self {
			Self::Layout => "Layout",
			Self::Content => "Content",
			Self::Interactive => "Interactive",
			Self::Utility => "Utility",
		}
	}

	/// Blurb shown under the heading
	pub fn description(&self) -> &'static str {
		match self {
			Self::Layout => "Structure and organize your page",
			Self::Content => "Add text, images, and information",
			Self::Interactive => "Engage visitors with dynamic content",
			Self::Utility => "Additional features and tools",
		}
	}
}

impl fmt::Display for BlockCategory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Failure raised by a block renderer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
	/// A field the block cannot render without is empty
	#[error("Missing required field: {0}")]
	MissingField(String),

	/// A field holds a value the block cannot use
	#[error("Invalid value for {field}: {reason}")]
	InvalidProp {
		/// Field key
		field: String,
		/// What is wrong with it
		reason: String,
	},

	/// Any other failure
	#[error("{0}")]
	Failed(String),
}

/// Everything a renderer sees of the block being rendered
///
/// Rich text props are already sanitized.
pub struct BlockContext<'a> {
	block: &'a Block,
	props: &'a Props,
	descriptor: &'a BlockTypeDescriptor,
}

impl<'a> BlockContext<'a> {
	/// Context over `props`, which may differ from `block.props` after sanitizing
	pub fn new(block: &'a Block, props: &'a Props, descriptor: &'a BlockTypeDescriptor) -> Self {
		Self {
			block,
			props,
			descriptor,
		}
	}

	/// Block id
	pub fn id(&self) -> &str {
		&self.block.id
	}

	/// Block type id
	pub fn block_type(&self) -> &str {
		&self.block.block_type
	}

	/// Props ready for display
	pub fn props(&self) -> &'a Props {
		self.props
	}

	/// Descriptor of the block type
	pub fn descriptor(&self) -> &'a BlockTypeDescriptor {
		self.descriptor
	}
}

/// Renders one block type to HTML
///
/// Renderers must escape plain text themselves; rich text props arrive
/// sanitized and are inserted as-is. Closures of the right shape implement
/// this trait.
pub trait BlockRenderer: Send + Sync {
	/// Render the block
	fn render(&self, ctx: &BlockContext<'_>) -> Result<String, RenderError>;
}

impl<F> BlockRenderer for F
where
	F: Fn(&BlockContext<'_>) -> Result<String, RenderError> + Send + Sync,
{
	fn render(&self, ctx: &BlockContext<'_>) -> Result<String, RenderError> {
		self(ctx)
	}
}

/// Registered definition of a block type
///
/// # Examples
///
/// ```
/// use kapwa_cms::blocks::{BlockCategory, BlockContext, BlockTypeDescriptor, PropAccess, RenderError};
/// use kapwa_cms::schema::FieldSchema;
/// use serde_json::json;
///
/// let quote = BlockTypeDescriptor::new(
///     "quote",
///     "Quote",
///     BlockCategory::Content,
///     |ctx: &BlockContext<'_>| -> Result<String, RenderError> {
///         Ok(format!("<blockquote>{}</blockquote>", ctx.props().text_escaped("text")))
///     },
/// )
/// .with_default_props(json!({"text": "Say something"}))
/// .with_field("text", FieldSchema::textarea("Quote", Some(3)).required());
///
/// assert_eq!(quote.default_props["text"], "Say something");
/// assert!(quote.field_schema.contains_key("text"));
/// ```
#[derive(Clone)]
pub struct BlockTypeDescriptor {
	/// Type id stored in documents
	pub type_id: String,
	/// Human label
	pub display_name: String,
	/// Picker category
	pub category: BlockCategory,
	/// One-line explanation for the picker
	pub description: String,
	/// Icon name for the picker
	pub icon: String,
	/// Props of a freshly inserted block
	pub default_props: Props,
	/// Editable fields in display order
	pub field_schema: SchemaMap,
	renderer: Arc<dyn BlockRenderer>,
}

impl BlockTypeDescriptor {
	/// Descriptor with empty defaults and schema
	pub fn new<R>(type_id: impl Into<String>, display_name: impl Into<String>, category: BlockCategory, renderer: R) -> Self
	where
		R: BlockRenderer + 'static,
	{
		Self {
			type_id: type_id.into(),
			display_name: display_name.into(),
			category,
			description: String::new(),
			icon: String::new(),
			default_props: Props::new(),
			field_schema: SchemaMap::new(),
			renderer: Arc::new(renderer),
		}
	}

	/// Set the picker description
	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = description.into();
		self
	}

	/// Set the picker icon
	pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
		self.icon = icon.into();
		self
	}

	/// Set default props from a JSON object; anything else clears them
	pub fn with_default_props(mut self, props: Value) -> Self {
		self.default_props = match props {
			Value::Object(map) => map,
			_ => Props::new(),
		};
		self
	}

	/// Declare one editable field
	pub fn with_field(mut self, key: impl Into<String>, schema: FieldSchema) -> Self {
		self.field_schema.insert(key.into(), schema);
		self
	}

	/// The type's renderer
	pub fn renderer(&self) -> &dyn BlockRenderer {
		self.renderer.as_ref()
	}

	/// Build a new block of this type
	pub fn instantiate(&self) -> Block {
		Block::new(self.type_id.clone(), self.default_props.clone())
	}
}

impl fmt::Debug for BlockTypeDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BlockTypeDescriptor")
			.field("type_id", &self.type_id)
			.field("display_name", &self.display_name)
			.field("category", &self.category)
			.field("fields", &self.field_schema.keys().collect::<Vec<_>>())
			.finish_non_exhaustive()
	}
}
