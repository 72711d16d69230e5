//! Page builder admin UI
//!
//! Property editing for the selected block, the form widgets it renders
//! with, and the block picker.

pub mod block_picker;
pub mod property_editor;
pub mod widgets;

pub use block_picker::{BlockPicker, PickerGroup};
pub use property_editor::{EditorField, PropertyEditor, ValidationIssue};
pub use widgets::{Attrs, Widget, WidgetType};
