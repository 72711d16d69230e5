//! # Kapwa Conf
//!
//! Layered settings for the page builder.
//!
//! Sources are merged in priority order (environment variables > config files
//! > defaults). Nested tables are deep-merged, so an environment override of
//! a single key leaves its siblings intact.
//!
//! ## Example
//!
//! ```
//! use kapwa_conf::PageBuilderSettings;
//! use kapwa_conf::builder::SettingsBuilder;
//! use kapwa_conf::sources::DefaultSource;
//! use serde_json::json;
//!
//! let settings: PageBuilderSettings = SettingsBuilder::new()
//!     .add_source(DefaultSource::new().with_value("editor", json!({"history_limit": 5})))
//!     .build()
//!     .unwrap();
//! assert_eq!(settings.editor.history_limit, 5);
//! assert_eq!(settings.editor.preview_length, 100);
//! ```

#![warn(missing_docs)]

pub mod builder;
pub mod settings;
pub mod sources;

pub use builder::{SettingsBuilder, SettingsError};
pub use settings::{EditorSettings, PageBuilderSettings, RendererSettings};
pub use sources::{ConfigSource, SourceError};
