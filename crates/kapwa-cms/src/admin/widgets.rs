//! Form widgets for the property editor
//!
//! Every widget escapes its name, value and attribute values. Attributes
//! render in insertion order.

use crate::schema::{FieldKind, FieldSchema, SelectOption};
use indexmap::IndexMap;
use kapwa_core::security::{escape_html, escape_html_attr};
use serde::{Deserialize, Serialize};

/// Extra attributes of a widget, rendered in insertion order
pub type Attrs = IndexMap<String, String>;

/// Widget type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WidgetType {
	/// Single-line input
	TextInput,
	/// URL input
	UrlInput,
	/// Integer input
	NumberInput,
	/// Multi-line text
	Textarea,
	/// Checkbox
	Checkbox,
	/// Dropdown
	Select,
}

/// Base widget trait
pub trait Widget: Send + Sync {
	/// Get the widget type
	fn widget_type(&self) -> WidgetType;

	/// Render the widget as HTML
	fn render(&self, name: &str, value: Option<&str>, attrs: &Attrs) -> String;

	/// Render the widget with choices (for select widgets)
	fn render_with_choices(&self, name: &str, value: Option<&str>, attrs: &Attrs, _choices: &[SelectOption]) -> String {
		self.render(name, value, attrs)
	}
}

fn push_attrs(html: &mut String, attrs: &Attrs) {
	for (key, val) in attrs {
		html.push_str(&format!(r#" {}="{}""#, key, escape_html_attr(val)));
	}
}

/// `<input>` of a text-like type
#[derive(Debug, Clone)]
pub struct TextInput {
	input_type: &'static str,
}

impl TextInput {
	/// Text input
	pub fn new() -> Self {
		Self { input_type: "text" }
	}

	/// URL input
	pub fn url() -> Self {
		Self { input_type: "url" }
	}

	/// Number input
	pub fn number() -> Self {
		Self { input_type: "number" }
	}
}

impl Default for TextInput {
	fn default() -> Self {
		Self::new()
	}
}

impl Widget for TextInput {
	fn widget_type(&self) -> WidgetType {
		match self.input_type {
			"url" => WidgetType::UrlInput,
			"number" => WidgetType::NumberInput,
			_ => WidgetType::TextInput,
		}
	}

	fn render(&self, name: &str, value: Option<&str>, attrs: &Attrs) -> String {
		let mut html = format!(
			r#"<input type="{}" name="{}""#,
			self.input_type,
			escape_html_attr(name)
		);

		if let Some(v) = value {
			html.push_str(&format!(r#" value="{}""#, escape_html_attr(v)));
		}

		push_attrs(&mut html, attrs);
		html.push_str(" />");
		html
	}
}

/// Multi-line text widget
#[derive(Debug, Clone)]
pub struct Textarea {
	rows: u32,
}

impl Textarea {
	/// Textarea with the given number of visible rows
	pub fn new(rows: u32) -> Self {
		Self { rows }
	}
}

impl Widget for Textarea {
	fn widget_type(&self) -> WidgetType {
		WidgetType::Textarea
	}

	fn render(&self, name: &str, value: Option<&str>, attrs: &Attrs) -> String {
		let mut html = format!(
			r#"<textarea name="{}" rows="{}""#,
			escape_html_attr(name),
			self.rows
		);
		push_attrs(&mut html, attrs);
		html.push('>');
		html.push_str(&escape_html(value.unwrap_or_default()));
		html.push_str("</textarea>");
		html
	}
}

/// Checkbox input widget
#[derive(Debug, Clone, Default)]
pub struct CheckboxInput;

impl Widget for CheckboxInput {
	fn widget_type(&self) -> WidgetType {
		WidgetType::Checkbox
	}

	fn render(&self, name: &str, value: Option<&str>, attrs: &Attrs) -> String {
		let mut html = format!(r#"<input type="checkbox" name="{}""#, escape_html_attr(name));

		if value == Some("true") || value == Some("1") || value == Some("on") {
			html.push_str(" checked");
		}

		push_attrs(&mut html, attrs);
		html.push_str(" />");
		html
	}
}

/// Select widget
#[derive(Debug, Clone, Default)]
pub struct Select;

impl Widget for Select {
	fn widget_type(&self) -> WidgetType {
		WidgetType::Select
	}

	fn render(&self, name: &str, value: Option<&str>, attrs: &Attrs) -> String {
		self.render_with_choices(name, value, attrs, &[])
	}

	fn render_with_choices(&self, name: &str, value: Option<&str>, attrs: &Attrs, choices: &[SelectOption]) -> String {
		let mut html = format!(r#"<select name="{}""#, escape_html_attr(name));
		push_attrs(&mut html, attrs);
		html.push('>');

		for choice in choices {
			html.push_str(&format!(r#"<option value="{}""#, escape_html_attr(&choice.value)));
			if Some(choice.value.as_str()) == value {
				html.push_str(" selected");
			}
			html.push('>');
			html.push_str(&escape_html(&choice.label));
			html.push_str("</option>");
		}

		html.push_str("</select>");
		html
	}
}

/// Widget and default attributes for a scalar field
///
/// Array fields have no single widget and yield `None`.
pub fn widget_for(field: &FieldSchema) -> Option<(Box<dyn Widget>, Attrs)> {
	let mut attrs = Attrs::new();
	let widget: Box<dyn Widget> = match &field.kind {
		FieldKind::Text => Box::new(TextInput::new()),
		FieldKind::Url => {
			attrs.insert("placeholder".to_string(), "https://...".to_string());
			Box::new(TextInput::url())
		}
		FieldKind::Number { min, max } => {
			if let Some(min) = min {
				attrs.insert("min".to_string(), min.to_string());
			}
			if let Some(max) = max {
				attrs.insert("max".to_string(), max.to_string());
			}
			Box::new(TextInput::number())
		}
		FieldKind::Textarea { rows } => Box::new(Textarea::new(rows.unwrap_or(3))),
		FieldKind::Richtext => {
			attrs.insert("placeholder".to_string(), "Enter HTML content...".to_string());
			Box::new(Textarea::new(6))
		}
		FieldKind::Boolean => Box::new(CheckboxInput),
		FieldKind::Select { .. } => Box::new(Select),
		FieldKind::Array { .. } => return None,
	};
	if let Some(placeholder) = &field.placeholder {
		attrs.insert("placeholder".to_string(), placeholder.clone());
	}
	if field.required && !matches!(field.kind, FieldKind::Boolean) {
		attrs.insert("required".to_string(), "required".to_string());
	}
	Some((widget, attrs))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[test]
	fn test_text_input_escapes() {
		// Arrange
		let attrs = Attrs::from([("id".to_string(), "f\"x".to_string())]);

		// Act
		let html = TextInput::new().render("headline", Some("<b>\"hi\"</b>"), &attrs);

		// Assert
		assert_eq!(
			html,
			r#"<input type="text" name="headline" value="&lt;b&gt;&quot;hi&quot;&lt;/b&gt;" id="f&quot;x" />"#
		);
	}

	#[test]
	fn test_textarea_escapes_body() {
		let html = Textarea::new(2).render("sub", Some("</textarea><script>"), &Attrs::new());

		assert_eq!(
			html,
			r#"<textarea name="sub" rows="2">&lt;/textarea&gt;&lt;script&gt;</textarea>"#
		);
	}

	#[rstest]
	#[case(Some("true"), true)]
	#[case(Some("on"), true)]
	#[case(Some("false"), false)]
	#[case(None, false)]
	fn test_checkbox_checked(#[case] value: Option<&str>, #[case] checked: bool) {
		let html = CheckboxInput.render("dismissible", value, &Attrs::new());

		assert_eq!(html.contains(" checked"), checked);
	}

	#[test]
	fn test_select_marks_current_choice() {
		let choices = vec![
			SelectOption {
				value: "left".to_string(),
				label: "Left".to_string(),
			},
			SelectOption {
				value: "center".to_string(),
				label: "Center".to_string(),
			},
		];

		let html = Select.render_with_choices("alignment", Some("center"), &Attrs::new(), &choices);

		assert_eq!(
			html,
			r#"<select name="alignment"><option value="left">Left</option><option value="center" selected>Center</option></select>"#
		);
	}

	#[rstest]
	#[case(FieldSchema::text("T"), Some(WidgetType::TextInput))]
	#[case(FieldSchema::url("U"), Some(WidgetType::UrlInput))]
	#[case(FieldSchema::number("N").with_range(1, 12), Some(WidgetType::NumberInput))]
	#[case(FieldSchema::richtext("R"), Some(WidgetType::Textarea))]
	#[case(FieldSchema::boolean("B"), Some(WidgetType::Checkbox))]
	#[case(FieldSchema::array("A", None, serde_json::Value::Null), None)]
	fn test_widget_for(#[case] field: FieldSchema, #[case] expected: Option<WidgetType>) {
		assert_eq!(widget_for(&field).map(|(widget, _)| widget.widget_type()), expected);
	}

	#[test]
	fn test_number_bounds_become_attributes() {
		let (_, attrs) = widget_for(&FieldSchema::number("Limit").with_range(1, 12).required()).unwrap();

		assert_eq!(attrs.get("min").map(String::as_str), Some("1"));
		assert_eq!(attrs.get("max").map(String::as_str), Some("12"));
		assert!(attrs.contains_key("required"));
	}
}
