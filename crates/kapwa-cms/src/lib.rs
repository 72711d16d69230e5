//! # Kapwa CMS
//!
//! The page builder engine behind Kapwa's admin "page builder".
//!
//! A page is an ordered list of typed content blocks. Each block type is
//! described once, at startup, by a descriptor that binds a type id to a
//! label, a category, default properties, a declarative field schema and a
//! renderer. Everything else works off that registry:
//!
//! - the document editor inserts, deletes, reorders and edits blocks,
//!   producing a fresh immutable document on every change;
//! - the property editor turns a block's schema (or, for undeclared data,
//!   an inferred schema) into form controls and coerced prop edits;
//! - the renderer turns a block list into HTML for admins or the public,
//!   isolating failures per block and sanitizing rich text.
//!
//! ## Architecture
//!
//! ```text
//! kapwa-cms
//! ├── schema      - Field schema variants, inference, coercion
//! ├── blocks      - Block instances, descriptors, registry, builtin types
//! ├── pages       - Page document, records, templates
//! ├── editor      - Document editor, drag state machine, undo history
//! ├── admin       - Property editor, form widgets, block picker
//! ├── render      - Audience-aware renderer with failure isolation
//! └── persistence - Page store boundary and save coalescing
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use kapwa_cms::prelude::*;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(BlockRegistry::with_builtin_blocks());
//! let mut editor = DocumentEditor::new(PageDocument::new("Home"), registry.clone());
//!
//! let id = editor.insert_block(0, "hero").unwrap();
//! assert!(editor.is_dirty());
//! assert_eq!(editor.selected(), Some(id.as_str()));
//!
//! let renderer = PageRenderer::new(registry);
//! let html = renderer.render_to_html(&editor.document().blocks, Audience::Public);
//! assert!(html.contains("Welcome to Our Community"));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

// Re-export for block authors
pub use serde_json;

pub mod admin;
pub mod blocks;
pub mod editor;
pub mod pages;
pub mod persistence;
pub mod render;
pub mod schema;

/// Convenient re-exports of commonly used items
pub mod prelude {
	pub use crate::admin::{BlockPicker, PropertyEditor};
	pub use crate::blocks::{
		Block, BlockCategory, BlockContext, BlockRegistry, BlockRenderer, BlockTypeDescriptor,
		PropAccess, Props, RenderError, global_registry, init_global_registry,
	};
	pub use crate::editor::{DocumentEditor, DragState, ViewMode};
	pub use crate::error::{CmsError, CmsResult};
	pub use crate::pages::{PageDocument, PageRecord, PageStatus, PageTemplate, PageType, PageUpdate};
	pub use crate::persistence::{MemoryPageStore, PageStore, SaveCoordinator, SaveOutcome};
	pub use crate::render::{Audience, PageRenderer, RenderedBlock};
	pub use crate::schema::{FieldKind, FieldSchema, SchemaMap};
}

/// CMS error types
pub mod error {
	use kapwa_conf::SettingsError;
	use thiserror::Error;

	/// Default message shown when a save fails without details
	pub const SAVE_FAILED_MESSAGE: &str = "Failed to save page.";

	/// CMS-related errors
	#[derive(Error, Debug)]
	pub enum CmsError {
		/// Block type registered twice
		#[error("Block type already registered: {0}")]
		DuplicateBlockType(String),

		/// Field schema rejected at registration
		#[error("Invalid schema for {block_type}.{field}: {reason}")]
		InvalidSchema {
			/// Block type owning the schema
			block_type: String,
			/// Offending field key
			field: String,
			/// What is wrong with it
			reason: String,
		},

		/// Page not found
		#[error("Page not found: {0}")]
		PageNotFound(String),

		/// Template not found
		#[error("Template not found: {0}")]
		TemplateNotFound(String),

		/// Slug already used by another page
		#[error("Slug already in use: {0}")]
		DuplicateSlug(String),

		/// The persistence collaborator rejected or failed a request
		#[error("{message}")]
		Persistence {
			/// User-displayable message
			message: String,
		},

		/// The process-wide registry was already installed
		#[error("Block registry already initialized")]
		RegistryAlreadyInitialized,

		/// Settings could not be loaded or applied
		#[error(transparent)]
		Settings(#[from] SettingsError),
	}

	impl CmsError {
		/// Persistence error with a fallback message when `message` is blank
		pub fn persistence(message: impl Into<String>) -> Self {
			let message = message.into();
			let message = if message.trim().is_empty() {
				SAVE_FAILED_MESSAGE.to_string()
			} else {
				message
			};
			Self::Persistence { message }
		}
	}

	/// Result type for CMS operations
	pub type CmsResult<T> = Result<T, CmsError>;
}
