//! Leaf utilities shared by every layer
//!
//! ```rust
//! use kapwa::core::security::escape_html;
//! use kapwa::core::text::slugify;
//!
//! assert_eq!(escape_html("<b>"), "&lt;b&gt;");
//! assert_eq!(slugify("Our Team"), "our-team");
//! ```

pub use kapwa_core::*;
