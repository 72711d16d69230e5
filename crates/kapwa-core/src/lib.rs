//! # Kapwa Core
//!
//! Leaf utilities for the Kapwa page builder.
//!
//! ## Modules
//!
//! - [`security`]: HTML escaping, safe-URL checks and the allow-list sanitizer
//!   applied to rich text before it reaches the display layer
//! - [`text`]: slugs, preview truncation and label humanizing
//!
//! ## Example
//!
//! ```
//! use kapwa_core::security::sanitize_html;
//! use kapwa_core::text::slugify;
//!
//! assert_eq!(sanitize_html("<p>hi</p><script>alert(1)</script>"), "<p>hi</p>");
//! assert_eq!(slugify("About Us"), "about-us");
//! ```

#![warn(missing_docs)]

pub mod security;
pub mod text;
