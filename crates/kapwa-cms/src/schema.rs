//! Declarative field schemas
//!
//! A [`FieldSchema`] describes how one block property is edited: its input
//! kind, label and constraints. Schemas are data, serialized with a `type`
//! tag, so block types can be declared without compiling a struct per block.
//!
//! Props that have no declared schema still get one through
//! [`infer_field`], which guesses a kind from the key name and the current
//! value. Values are never rejected for having the wrong shape; they are
//! coerced at the point of use with [`FieldSchema::coerce`].

use indexmap::IndexMap;
use kapwa_core::text::humanize_key;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordered map of property key to schema
pub type SchemaMap = IndexMap<String, FieldSchema>;

/// One choice of a `select` field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
	/// Stored value
	pub value: String,
	/// Displayed label
	pub label: String,
}

/// Input kind of a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
	/// Single-line text
	Text,
	/// Multi-line plain text
	Textarea {
		/// Visible rows
		#[serde(default, skip_serializing_if = "Option::is_none")]
		rows: Option<u32>,
	},
	/// HTML content, sanitized before display
	Richtext,
	/// Link or image address
	Url,
	/// Integer input
	Number {
		/// Lower bound
		#[serde(default, skip_serializing_if = "Option::is_none")]
		min: Option<i64>,
		/// Upper bound
		#[serde(default, skip_serializing_if = "Option::is_none")]
		max: Option<i64>,
	},
	/// Checkbox
	Boolean,
	/// One value out of a fixed list
	Select {
		/// Allowed values in display order
		options: Vec<SelectOption>,
	},
	/// Repeated group of nested fields
	Array {
		/// Schema of each item; inferred per key when absent
		#[serde(default, skip_serializing_if = "Option::is_none")]
		item_schema: Option<SchemaMap>,
		/// Value cloned for a freshly appended item
		#[serde(default, skip_serializing_if = "Value::is_null")]
		item_template: Value,
		/// Noun used for items in the editor ("Button", "Card")
		#[serde(default, skip_serializing_if = "Option::is_none")]
		item_label: Option<String>,
	},
}

impl FieldKind {
	/// Tag name as serialized
	pub fn name(&self) -> &'static str {
		match self {
			Self::Text => "text",
			Self::Textarea { .. } => "textarea",
			Self::Richtext => "richtext",
			Self::Url => "url",
			Self::Number { .. } => "number",
			Self::Boolean => "boolean",
			Self::Select { .. } => "select",
			Self::Array { .. } => "array",
		}
	}
}

/// Editable property description
///
/// # Examples
///
/// ```
/// use kapwa_cms::schema::{FieldKind, FieldSchema};
/// use serde_json::json;
///
/// let field = FieldSchema::number("Items").with_range(1, 12);
/// assert_eq!(field.coerce(&json!("40")), Some(json!(12)));
///
/// let parsed: FieldSchema = serde_json::from_value(json!({
///     "type": "textarea",
///     "label": "Subheadline",
///     "rows": 2
/// })).unwrap();
/// assert_eq!(parsed.kind, FieldKind::Textarea { rows: Some(2) });
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
	/// Input kind and its constraints
	#[serde(flatten)]
	pub kind: FieldKind,
	/// Form label
	#[serde(default)]
	pub label: String,
	/// Help text
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// Input placeholder
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub placeholder: Option<String>,
	/// Whether an empty value is reported by validation
	#[serde(default)]
	pub required: bool,
}

impl FieldSchema {
	/// Field of the given kind
	pub fn new(kind: FieldKind, label: impl Into<String>) -> Self {
		Self {
			kind,
			label: label.into(),
			description: None,
			placeholder: None,
			required: false,
		}
	}

	/// Single-line text field
	pub fn text(label: impl Into<String>) -> Self {
		Self::new(FieldKind::Text, label)
	}

	/// Multi-line text field
	pub fn textarea(label: impl Into<String>, rows: Option<u32>) -> Self {
		Self::new(FieldKind::Textarea { rows }, label)
	}

	/// HTML field
	pub fn richtext(label: impl Into<String>) -> Self {
		Self::new(FieldKind::Richtext, label)
	}

	/// URL field
	pub fn url(label: impl Into<String>) -> Self {
		Self::new(FieldKind::Url, label)
	}

	/// Unbounded integer field
	pub fn number(label: impl Into<String>) -> Self {
		Self::new(FieldKind::Number { min: None, max: None }, label)
	}

	/// Checkbox field
	pub fn boolean(label: impl Into<String>) -> Self {
		Self::new(FieldKind::Boolean, label)
	}

	/// Select field from `(value, label)` pairs
	pub fn select<'a>(label: impl Into<String>, options: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
		let options = options
			.into_iter()
			.map(|(value, label)| SelectOption {
				value: value.to_string(),
				label: label.to_string(),
			})
			.collect();
		Self::new(FieldKind::Select { options }, label)
	}

	/// Array field with an item schema and the template for new items
	pub fn array(label: impl Into<String>, item_schema: Option<SchemaMap>, item_template: Value) -> Self {
		Self::new(
			FieldKind::Array {
				item_schema,
				item_template,
				item_label: None,
			},
			label,
		)
	}

	/// Bound a number field
	pub fn with_range(mut self, min: i64, max: i64) -> Self {
		if let FieldKind::Number { min: lo, max: hi } = &mut self.kind {
			*lo = Some(min);
			*hi = Some(max);
		}
		self
	}

	/// Name array items in the editor
	pub fn with_item_label(mut self, item_label: impl Into<String>) -> Self {
		if let FieldKind::Array { item_label: slot, .. } = &mut self.kind {
			*slot = Some(item_label.into());
		}
		self
	}

	/// Mark as required
	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}

	/// Attach help text
	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	/// Attach a placeholder
	pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
		self.placeholder = Some(placeholder.into());
		self
	}

	/// Whether the field holds HTML that must be sanitized
	pub fn is_richtext(&self) -> bool {
		matches!(self.kind, FieldKind::Richtext)
	}

	/// Coerce an incoming value to this field's kind
	///
	/// Returns `None` when the value cannot be stored at all: a select value
	/// outside its options, or a non-array for an array field.
	pub fn coerce(&self, value: &Value) -> Option<Value> {
		match &self.kind {
			FieldKind::Text | FieldKind::Textarea { .. } | FieldKind::Richtext | FieldKind::Url => {
				Some(Value::String(value_to_text(value)))
			}
			FieldKind::Number { min, max } => {
				let mut number = coerce_integer(value);
				if let Some(min) = min {
					number = number.max(*min);
				}
				if let Some(max) = max {
					number = number.min(*max);
				}
				Some(Value::from(number))
			}
			FieldKind::Boolean => Some(Value::Bool(coerce_bool(value))),
			FieldKind::Select { options } => {
				let text = value_to_text(value);
				options
					.iter()
					.any(|option| option.value == text)
					.then_some(Value::String(text))
			}
			FieldKind::Array { .. } => value.is_array().then(|| value.clone()),
		}
	}

	/// Value for a freshly appended array item
	pub fn new_item(&self) -> Option<Value> {
		match &self.kind {
			FieldKind::Array { item_template, .. } => Some(if item_template.is_null() {
				Value::Object(Map::new())
			} else {
				item_template.clone()
			}),
			_ => None,
		}
	}

	/// Schema for `key` inside an item of this array field
	pub fn item_field(&self, key: &str, value: &Value) -> FieldSchema {
		match &self.kind {
			FieldKind::Array {
				item_schema: Some(schema),
				..
			} => schema
				.get(key)
				.cloned()
				.unwrap_or_else(|| infer_field(key, value)),
			_ => infer_field(key, value),
		}
	}

	/// Whether `value` counts as empty for `required`
	pub fn is_empty_value(&self, value: Option<&Value>) -> bool {
		match value {
			None | Some(Value::Null) => true,
			Some(Value::String(s)) => s.trim().is_empty(),
			Some(Value::Array(items)) => items.is_empty(),
			Some(_) => false,
		}
	}
}

/// Infer a field for an undeclared property
///
/// Key names are checked first (case-insensitively), then the runtime type
/// of the value.
///
/// # Examples
///
/// ```
/// use kapwa_cms::schema::{FieldKind, infer_field};
/// use serde_json::json;
///
/// assert_eq!(infer_field("logoUrl", &json!("")).kind, FieldKind::Url);
/// assert_eq!(infer_field("body", &json!("<p>x</p>")).kind, FieldKind::Richtext);
/// assert_eq!(infer_field("quote", &json!("")).kind, FieldKind::Textarea { rows: Some(3) });
/// assert_eq!(infer_field("visible", &json!(true)).kind, FieldKind::Boolean);
/// assert_eq!(infer_field("headline", &json!("Hi")).label, "Headline");
/// ```
pub fn infer_field(key: &str, value: &Value) -> FieldSchema {
	FieldSchema::new(infer_kind(key, value), humanize_key(key))
}

fn infer_kind(key: &str, value: &Value) -> FieldKind {
	let key_lower = key.to_lowercase();

	if ["url", "image", "href", "logo"]
		.iter()
		.any(|needle| key_lower.contains(needle))
	{
		return FieldKind::Url;
	}
	if matches!(key_lower.as_str(), "content" | "html" | "body") {
		return FieldKind::Richtext;
	}
	if key_lower.contains("description") || key_lower.contains("message") || key_lower == "quote" {
		return FieldKind::Textarea { rows: Some(3) };
	}

	match value {
		Value::Bool(_) => FieldKind::Boolean,
		Value::Number(_) => FieldKind::Number { min: None, max: None },
		Value::Array(_) => FieldKind::Array {
			item_schema: None,
			item_template: Value::Null,
			item_label: None,
		},
		_ => FieldKind::Text,
	}
}

/// Display text of any JSON value
///
/// Strings pass through, scalars use their JSON spelling, and null or
/// structured values become empty.
pub fn value_to_text(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		Value::Number(n) => n.to_string(),
		Value::Bool(b) => b.to_string(),
		Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
	}
}

/// Integer reading of a value, `0` when there is none
///
/// Strings are read like a form input: leading whitespace, an optional sign,
/// then as many digits as present (`"12px"` is `12`).
pub fn coerce_integer(value: &Value) -> i64 {
	parse_integer(value).unwrap_or(0)
}

/// Integer reading of a value, if it has one
pub fn parse_integer(value: &Value) -> Option<i64> {
	match value {
		Value::Number(n) => n
			.as_i64()
			.or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
		Value::String(s) => parse_leading_integer(s),
		_ => None,
	}
}

fn parse_leading_integer(text: &str) -> Option<i64> {
	let trimmed = text.trim_start();
	let (sign_len, negative) = match trimmed.as_bytes().first() {
		Some(b'-') => (1, true),
		Some(b'+') => (1, false),
		_ => (0, false),
	};
	let digits: String = trimmed[sign_len..]
		.chars()
		.take_while(|c| c.is_ascii_digit())
		.collect();
	let magnitude = digits.parse::<i64>().ok()?;
	Some(if negative { -magnitude } else { magnitude })
}

/// Boolean reading of a value
pub fn coerce_bool(value: &Value) -> bool {
	match value {
		Value::Bool(b) => *b,
		Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
		Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "on" | "1" | "yes"),
		_ => false,
	}
}

/// Problem found in a schema at registration time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
	/// Dotted path of the offending field
	pub field: String,
	/// What is wrong with it
	pub reason: String,
}

/// Check a schema for constraints the editor cannot honour
///
/// Arrays may not nest inside array items, selects need options, number
/// bounds must be ordered, and array templates must be objects.
pub fn validate_schema(schema: &SchemaMap) -> Result<(), SchemaViolation> {
	validate_fields(schema, "", false)
}

fn validate_fields(schema: &SchemaMap, prefix: &str, inside_array: bool) -> Result<(), SchemaViolation> {
	for (key, field) in schema {
		let path = format!("{}{}", prefix, key);
		let violation = |reason: &str| SchemaViolation {
			field: path.clone(),
			reason: reason.to_string(),
		};
		match &field.kind {
			FieldKind::Select { options } if options.is_empty() => {
				return Err(violation("select field has no options"));
			}
			FieldKind::Number {
				min: Some(min),
				max: Some(max),
			} if min > max => {
				return Err(violation("minimum is greater than maximum"));
			}
			FieldKind::Array { .. } if inside_array => {
				return Err(violation("arrays cannot nest inside array items"));
			}
			FieldKind::Array {
				item_schema,
				item_template,
				..
			} => {
				if !(item_template.is_null() || item_template.is_object()) {
					return Err(violation("item template must be an object"));
				}
				if let Some(item_schema) = item_schema {
					validate_fields(item_schema, &format!("{}.", path), true)?;
				}
			}
			_ => {}
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case("imageUrl", json!(""), "url")]
	#[case("backgroundImage", json!(""), "url")]
	#[case("href", json!(3), "url")]
	#[case("partner_logo", json!(null), "url")]
	#[case("content", json!("<p/>"), "richtext")]
	#[case("HTML", json!(""), "richtext")]
	#[case("contents", json!(""), "text")]
	#[case("short_description", json!(""), "textarea")]
	#[case("welcomeMessage", json!(""), "textarea")]
	#[case("quote", json!(""), "textarea")]
	#[case("dismissible", json!(false), "boolean")]
	#[case("columns", json!(3), "number")]
	#[case("items", json!([]), "array")]
	#[case("headline", json!("x"), "text")]
	#[case("meta", json!({"a": 1}), "text")]
	fn test_infer_kind(#[case] key: &str, #[case] value: Value, #[case] expected: &str) {
		assert_eq!(infer_field(key, &value).kind.name(), expected);
	}

	#[rstest]
	#[case(json!(7), 7)]
	#[case(json!(7.9), 7)]
	#[case(json!("42"), 42)]
	#[case(json!("  -5 apples"), -5)]
	#[case(json!("abc"), 0)]
	#[case(json!(""), 0)]
	#[case(json!(true), 0)]
	#[case(json!(null), 0)]
	#[case(json!("99999999999999999999"), 0)]
	fn test_coerce_integer(#[case] value: Value, #[case] expected: i64) {
		assert_eq!(coerce_integer(&value), expected);
	}

	#[rstest]
	#[case(json!(true), true)]
	#[case(json!("on"), true)]
	#[case(json!("FALSE"), false)]
	#[case(json!(1), true)]
	#[case(json!(0), false)]
	#[case(json!([true]), false)]
	fn test_coerce_bool(#[case] value: Value, #[case] expected: bool) {
		assert_eq!(coerce_bool(&value), expected);
	}

	#[test]
	fn test_coerce_select_rejects_unknown_option() {
		// Arrange
		let field = FieldSchema::select("Columns", [("2", "2 Columns"), ("3", "3 Columns")]);

		// Act & Assert
		assert_eq!(field.coerce(&json!(3)), Some(json!("3")));
		assert_eq!(field.coerce(&json!("5")), None);
	}

	#[test]
	fn test_coerce_text_kinds_stringify() {
		let field = FieldSchema::text("Title");

		assert_eq!(field.coerce(&json!(12)), Some(json!("12")));
		assert_eq!(field.coerce(&json!(null)), Some(json!("")));
	}

	#[test]
	fn test_coerce_array_requires_array() {
		let field = FieldSchema::array("Items", None, Value::Null);

		assert_eq!(field.coerce(&json!("x")), None);
		assert_eq!(field.coerce(&json!([1])), Some(json!([1])));
		assert_eq!(field.new_item(), Some(json!({})));
	}

	#[test]
	fn test_schema_serializes_with_type_tag() {
		// Arrange
		let field = FieldSchema::array(
			"Buttons",
			Some(SchemaMap::from([("label".to_string(), FieldSchema::text("Button Text"))])),
			json!({"label": "Click Here"}),
		)
		.with_item_label("Button")
		.required();

		// Act
		let value = serde_json::to_value(&field).unwrap();
		let back: FieldSchema = serde_json::from_value(value.clone()).unwrap();

		// Assert
		assert_eq!(value["type"], "array");
		assert_eq!(value["item_label"], "Button");
		assert_eq!(value["item_schema"]["label"]["type"], "text");
		assert_eq!(back, field);
	}

	#[rstest]
	#[case(FieldSchema::select("Empty", Vec::<(&str, &str)>::new()), "x")]
	#[case(FieldSchema::number("Bad").with_range(5, 1), "x")]
	#[case(FieldSchema::array("Bad", None, json!([])), "x")]
	#[case(
		FieldSchema::array(
			"Outer",
			Some(SchemaMap::from([("inner".to_string(), FieldSchema::array("Inner", None, Value::Null))])),
			Value::Null,
		),
		"x.inner"
	)]
	fn test_validate_schema_violations(#[case] field: FieldSchema, #[case] path: &str) {
		let schema = SchemaMap::from([("x".to_string(), field)]);

		let violation = validate_schema(&schema).unwrap_err();

		assert_eq!(violation.field, path);
	}

	#[test]
	fn test_validate_schema_accepts_nested_primitives() {
		let schema = SchemaMap::from([(
			"steps".to_string(),
			FieldSchema::array(
				"Steps",
				Some(SchemaMap::from([
					("number".to_string(), FieldSchema::number("Step Number")),
					("title".to_string(), FieldSchema::text("Title")),
				])),
				json!({"number": 1}),
			),
		)]);

		assert!(validate_schema(&schema).is_ok());
	}
}
