//! Page builder engine
//!
//! Unified access to the block registry, field schemas, page documents, the
//! document and property editors, the renderer and page persistence.
//!
//! ```rust
//! use kapwa::cms::admin::BlockPicker;
//! use kapwa::cms::blocks::BlockRegistry;
//!
//! let registry = BlockRegistry::with_builtin_blocks();
//! let groups = BlockPicker::new(&registry).groups();
//! assert_eq!(groups[0].category.label(), "Layout");
//! ```

pub use kapwa_cms::*;
