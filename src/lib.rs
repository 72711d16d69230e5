//! # Kapwa
//!
//! Block-based page composition for community websites.
//!
//! Pages are ordered lists of typed content blocks. Block types are
//! registered once with a field schema and a renderer; admins assemble
//! pages in a document editor, edit each block through a schema-driven
//! property editor, and the renderer turns the result into HTML for the
//! admin preview or the public site.
//!
//! ## Feature Flags
//!
//! - `core` - Escaping, the rich text sanitizer and text helpers
//! - `conf` - Layered page builder settings (defaults, TOML file, environment)
//! - `cms` (default via `full`) - Block registry, editors, renderer and persistence
//! - `full` - Everything above
//!
//! ## Quick Example
//!
//! ```rust
//! # #[cfg(feature = "cms")]
//! # {
//! use kapwa::prelude::*;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(BlockRegistry::with_builtin_blocks());
//! let mut editor = DocumentEditor::new(PageDocument::new("About"), registry.clone());
//! let id = editor.insert_block(0, "rich_text_section").unwrap();
//! editor.edit_field(&id, "content", "<p>Hello</p><script>x()</script>".into());
//!
//! let html = PageRenderer::new(registry).render_to_html(&editor.document().blocks, Audience::Public);
//! assert!(html.contains("<p>Hello</p>"));
//! assert!(!html.contains("script"));
//! # }
//! ```

#![warn(missing_docs)]

#[cfg(feature = "cms")]
pub mod cms;
#[cfg(feature = "conf")]
pub mod conf;
pub mod core;

// Re-export settings from dedicated crate
#[cfg(feature = "conf")]
pub use kapwa_conf::{EditorSettings, PageBuilderSettings, RendererSettings, SettingsError};

// Re-export leaf utilities
pub use kapwa_core::security::{HtmlSanitizer, SanitizerPolicy, escape_html, sanitize_html};

// Re-export page builder entry points
#[cfg(feature = "cms")]
pub use kapwa_cms::{
	blocks::{Block, BlockRegistry, BlockTypeDescriptor, global_registry, init_global_registry},
	editor::DocumentEditor,
	error::{CmsError, CmsResult},
	render::{Audience, PageRenderer},
};

/// Commonly used types
pub mod prelude {
	pub use crate::{HtmlSanitizer, escape_html, sanitize_html};

	#[cfg(feature = "conf")]
	pub use crate::{EditorSettings, PageBuilderSettings};

	#[cfg(feature = "cms")]
	pub use kapwa_cms::prelude::*;
}
