//! Block list renderer
//!
//! Renders a page's blocks for one of two audiences. Every block is
//! rendered on its own: a renderer that fails (or panics) only affects its
//! own block. Admins see a placeholder in its place, the public sees
//! nothing. Unregistered block types are handled the same way.
//!
//! Rich text props are passed through the allow-list sanitizer before the
//! block renderer sees them.

use crate::blocks::{Block, BlockContext, BlockRegistry, BlockTypeDescriptor, Props, RenderError};
use crate::error::CmsResult;
use crate::schema::{FieldKind, FieldSchema, infer_field};
use kapwa_conf::PageBuilderSettings;
use kapwa_core::security::xss::detect_xss_patterns;
use kapwa_core::security::{HtmlSanitizer, escape_html, escape_html_attr};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::{debug, warn};

/// Message shown to admins when a page has no blocks
pub const EMPTY_PAGE_NOTICE: &str = "No blocks to display. Add blocks to build your page.";

/// Who the output is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
	/// Page builder preview; problems are shown inline
	Admin,
	/// Site visitors; problem blocks are left out
	#[default]
	Public,
}

/// One entry of a rendered block list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedBlock {
	/// Output of a block renderer
	Block {
		/// Block id
		id: String,
		/// Block type id
		block_type: String,
		/// Renderer output
		html: String,
	},
	/// Placeholder for a block whose type is not registered
	UnknownType {
		/// Block id
		id: String,
		/// Unregistered type id
		block_type: String,
	},
	/// Placeholder for a block whose renderer failed
	Failed {
		/// Block id
		id: String,
		/// Block type id
		block_type: String,
		/// Failure message
		message: String,
	},
	/// Notice shown to admins in place of an empty page
	EmptyNotice,
}

impl RenderedBlock {
	/// Id of the block this entry stands for
	pub fn block_id(&self) -> Option<&str> {
		match self {
			Self::Block { id, .. } | Self::UnknownType { id, .. } | Self::Failed { id, .. } => Some(id),
			Self::EmptyNotice => None,
		}
	}

	/// Whether this entry replaces real block output
	pub fn is_placeholder(&self) -> bool {
		!matches!(self, Self::Block { .. })
	}

	/// Markup of this entry
	pub fn to_html(&self) -> String {
		match self {
			Self::Block { id, block_type, html } => format!(
				r#"<div class="kapwa-block" data-block-type="{}" data-block-id="{}">{}</div>"#,
				escape_html_attr(block_type),
				escape_html_attr(id),
				html
			),
			Self::UnknownType { id, block_type } => format!(
				concat!(
					r#"<div class="kapwa-block kapwa-block--unknown" data-block-type="{}" data-block-id="{}">"#,
					r#"<p class="kapwa-block__title">Unknown block type: {}</p>"#,
					r#"<p class="kapwa-block__detail">Block ID: {}</p></div>"#
				),
				escape_html_attr(block_type),
				escape_html_attr(id),
				escape_html(block_type),
				escape_html(id)
			),
			Self::Failed { id, block_type, message } => format!(
				concat!(
					r#"<div class="kapwa-block kapwa-block--error" data-block-type="{}" data-block-id="{}">"#,
					r#"<p class="kapwa-block__title">Error rendering block: {}</p>"#,
					r#"<pre class="kapwa-block__detail">{}</pre></div>"#
				),
				escape_html_attr(block_type),
				escape_html_attr(id),
				escape_html(block_type),
				escape_html(message)
			),
			Self::EmptyNotice => format!(r#"<div class="kapwa-empty-page"><p>{}</p></div>"#, EMPTY_PAGE_NOTICE),
		}
	}
}

/// Renders block lists through a registry
///
/// # Examples
///
/// ```
/// use kapwa_cms::blocks::{Block, BlockRegistry};
/// use kapwa_cms::render::{Audience, PageRenderer, RenderedBlock};
/// use std::sync::Arc;
///
/// let renderer = PageRenderer::new(Arc::new(BlockRegistry::with_builtin_blocks()));
/// let blocks = vec![Block::with_id("x", "legacy_widget", Default::default())];
///
/// assert!(renderer.render(&blocks, Audience::Public).is_empty());
/// assert_eq!(
///     renderer.render(&blocks, Audience::Admin),
///     vec![RenderedBlock::UnknownType { id: "x".into(), block_type: "legacy_widget".into() }]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct PageRenderer {
	registry: Arc<BlockRegistry>,
	sanitizer: Arc<HtmlSanitizer>,
	container_class: String,
}

impl PageRenderer {
	/// Renderer with the default sanitizer
	pub fn new(registry: Arc<BlockRegistry>) -> Self {
		Self {
			registry,
			sanitizer: Arc::new(HtmlSanitizer::new()),
			container_class: "kapwa-blocks".to_string(),
		}
	}

	/// Renderer configured from settings
	pub fn from_settings(registry: Arc<BlockRegistry>, settings: &PageBuilderSettings) -> CmsResult<Self> {
		Ok(Self::new(registry)
			.with_sanitizer(settings.sanitizer()?)
			.with_container_class(settings.renderer.container_class.clone()))
	}

	/// Replace the rich text sanitizer
	pub fn with_sanitizer(mut self, sanitizer: HtmlSanitizer) -> Self {
		self.sanitizer = Arc::new(sanitizer);
		self
	}

	/// Set the class of the wrapping element
	pub fn with_container_class(mut self, class: impl Into<String>) -> Self {
		self.container_class = class.into();
		self
	}

	/// Registry block types are resolved through
	pub fn registry(&self) -> &Arc<BlockRegistry> {
		&self.registry
	}

	/// Render `blocks` in order
	///
	/// An empty list yields [`RenderedBlock::EmptyNotice`] for admins and
	/// nothing for the public.
	pub fn render(&self, blocks: &[Block], audience: Audience) -> Vec<RenderedBlock> {
		if blocks.is_empty() {
			return match audience {
				Audience::Admin => vec![RenderedBlock::EmptyNotice],
				Audience::Public => Vec::new(),
			};
		}

		blocks
			.iter()
			.filter_map(|block| self.render_block(block, audience))
			.collect()
	}

	/// Render one block; `None` when the audience sees nothing for it
	pub fn render_block(&self, block: &Block, audience: Audience) -> Option<RenderedBlock> {
		let Some(descriptor) = self.registry.lookup(&block.block_type) else {
			debug!(block_id = %block.id, block_type = %block.block_type, "Skipping unregistered block type");
			return (audience == Audience::Admin).then(|| RenderedBlock::UnknownType {
				id: block.id.clone(),
				block_type: block.block_type.clone(),
			});
		};

		match self.run_renderer(block, descriptor) {
			Ok(html) => Some(RenderedBlock::Block {
				id: block.id.clone(),
				block_type: block.block_type.clone(),
				html,
			}),
			Err(message) => {
				warn!(
					block_id = %block.id,
					block_type = %block.block_type,
					error = %message,
					"Block failed to render"
				);
				(audience == Audience::Admin).then(|| RenderedBlock::Failed {
					id: block.id.clone(),
					block_type: block.block_type.clone(),
					message,
				})
			}
		}
	}

	/// Render `blocks` and join them inside the container element
	pub fn render_to_html(&self, blocks: &[Block], audience: Audience) -> String {
		let mut html = format!(r#"<div class="{}">"#, escape_html_attr(&self.container_class));
		for rendered in self.render(blocks, audience) {
			html.push_str(&rendered.to_html());
		}
		html.push_str("</div>");
		html
	}

	fn run_renderer(&self, block: &Block, descriptor: &BlockTypeDescriptor) -> Result<String, String> {
		let props = self.sanitize_props(&block.props, descriptor);
		let ctx = BlockContext::new(block, &props, descriptor);

		match catch_unwind(AssertUnwindSafe(|| descriptor.renderer().render(&ctx))) {
			Ok(Ok(html)) => Ok(html),
			Ok(Err(err)) => Err(render_error_message(&err)),
			Err(payload) => Err(panic_message(payload.as_ref())),
		}
	}

	fn sanitize_props(&self, props: &Props, descriptor: &BlockTypeDescriptor) -> Props {
		let mut props = props.clone();
		for (key, value) in props.iter_mut() {
			let field = descriptor
				.field_schema
				.get(key)
				.cloned()
				.unwrap_or_else(|| infer_field(key, value));
			self.sanitize_value(&field, value);
		}
		props
	}

	fn sanitize_value(&self, field: &FieldSchema, value: &mut Value) {
		match (&field.kind, value) {
			(FieldKind::Richtext, Value::String(html)) => {
				if detect_xss_patterns(html) {
					debug!(field = %field.label, "Stripping script-capable markup from rich text");
				}
				*html = self.sanitizer.sanitize(html);
			}
			(FieldKind::Array { .. }, Value::Array(items)) => {
				for item in items.iter_mut() {
					let Value::Object(item) = item else {
						continue;
					};
					for (item_key, item_value) in item.iter_mut() {
						let item_field = field.item_field(item_key, item_value);
						if item_field.is_richtext() {
							self.sanitize_value(&item_field, item_value);
						}
					}
				}
			}
			_ => {}
		}
	}
}

fn render_error_message(err: &RenderError) -> String {
	err.to_string()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(message) = payload.downcast_ref::<&str>() {
		(*message).to_string()
	} else if let Some(message) = payload.downcast_ref::<String>() {
		message.clone()
	} else {
		"Block renderer panicked".to_string()
	}
}
