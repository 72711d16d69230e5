//! Schema-driven property editor for one block
//!
//! Declared fields come from the block type's schema, in schema order.
//! Every other prop key, and every prop of an unregistered block, gets an
//! inferred field so nothing stored on a block is ever uneditable.
//!
//! The editor holds no draft state. Each edit helper returns the complete new
//! props bag, ready for [`DocumentEditor::update_props`], or `None` when the
//! edit cannot be stored.
//!
//! [`DocumentEditor::update_props`]: crate::editor::DocumentEditor::update_props

use super::widgets::widget_for;
use crate::blocks::{Block, BlockRegistry, BlockTypeDescriptor, Props};
use crate::schema::{
	FieldKind, FieldSchema, coerce_bool, coerce_integer, infer_field, parse_integer, value_to_text,
};
use kapwa_core::security::{escape_html, escape_html_attr};
use kapwa_core::text::humanize_key;
use serde_json::{Map, Value};

/// One editable field of the selected block
#[derive(Debug, Clone, PartialEq)]
pub struct EditorField {
	/// Prop key
	pub key: String,
	/// Declared or inferred schema
	pub schema: FieldSchema,
	/// Whether the schema was declared by the block type
	pub declared: bool,
	/// Current value, if the prop is set
	pub value: Option<Value>,
}

impl EditorField {
	/// Form label, humanized from the key when the schema has none
	pub fn label(&self) -> String {
		field_label(&self.key, &self.schema)
	}
}

/// Advisory problem with a field value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
	/// Prop key
	pub key: String,
	/// Message for the author
	pub message: String,
}

/// Property editor over one block
///
/// # Examples
///
/// ```
/// use kapwa_cms::admin::PropertyEditor;
/// use kapwa_cms::blocks::BlockRegistry;
/// use serde_json::json;
///
/// let registry = BlockRegistry::with_builtin_blocks();
/// let block = registry.lookup("needs_widget").unwrap().instantiate();
/// let editor = PropertyEditor::new(&block, &registry);
///
/// let props = editor.set_number("limit", "40").unwrap();
/// assert_eq!(props["limit"], json!(12));
/// assert_eq!(props["heading"], json!("Community Needs"));
///
/// assert!(editor.set_select("showType", "everything").is_none());
/// ```
pub struct PropertyEditor<'a> {
	block: &'a Block,
	descriptor: Option<&'a BlockTypeDescriptor>,
}

impl<'a> PropertyEditor<'a> {
	/// Editor for `block`, resolving its type in `registry`
	pub fn new(block: &'a Block, registry: &'a BlockRegistry) -> Self {
		Self {
			block,
			descriptor: registry.lookup(&block.block_type),
		}
	}

	/// Whether the block's type is registered
	pub fn is_registered(&self) -> bool {
		self.descriptor.is_some()
	}

	/// Display name of the block type, the raw type id when unregistered
	pub fn display_name(&self) -> &str {
		self.descriptor
			.map_or(self.block.block_type.as_str(), |descriptor| descriptor.display_name.as_str())
	}

	/// Current props
	pub fn props(&self) -> &Props {
		&self.block.props
	}

	/// Declared fields in schema order, then inferred fields in prop order
	pub fn fields(&self) -> Vec<EditorField> {
		let mut fields = Vec::new();
		if let Some(descriptor) = self.descriptor {
			for (key, schema) in &descriptor.field_schema {
				fields.push(EditorField {
					key: key.clone(),
					schema: schema.clone(),
					declared: true,
					value: self.block.props.get(key).cloned(),
				});
			}
		}
		for (key, value) in &self.block.props {
			if self.declared(key).is_none() {
				fields.push(EditorField {
					key: key.clone(),
					schema: infer_field(key, value),
					declared: false,
					value: Some(value.clone()),
				});
			}
		}
		fields
	}

	/// Schema of `key`, declared or inferred from its current value
	pub fn field(&self, key: &str) -> Option<FieldSchema> {
		match self.declared(key) {
			Some(schema) => Some(schema.clone()),
			None => self.block.props.get(key).map(|value| infer_field(key, value)),
		}
	}

	fn declared(&self, key: &str) -> Option<&'a FieldSchema> {
		self.descriptor
			.and_then(|descriptor| descriptor.field_schema.get(key))
	}

	fn with_prop(&self, key: &str, value: Value) -> Props {
		let mut props = self.block.props.clone();
		props.insert(key.to_string(), value);
		props
	}

	/// Set `key` to `value`, coerced to the field's kind
	///
	/// A key with neither a declared schema nor a current value is inferred
	/// from `value` itself.
	pub fn set_field(&self, key: &str, value: Value) -> Option<Props> {
		let schema = self
			.field(key)
			.unwrap_or_else(|| infer_field(key, &value));
		let coerced = schema.coerce(&value)?;
		Some(self.with_prop(key, coerced))
	}

	/// Set a text-like field
	pub fn set_text(&self, key: &str, text: &str) -> Option<Props> {
		self.set_field(key, Value::String(text.to_string()))
	}

	/// Set a number field from raw form input
	///
	/// Input without a leading integer stores `0`; declared bounds clamp.
	pub fn set_number(&self, key: &str, input: &str) -> Option<Props> {
		let number = coerce_integer(&Value::String(input.to_string()));
		self.set_field(key, Value::from(number))
	}

	/// Set a checkbox field
	pub fn set_bool(&self, key: &str, checked: bool) -> Option<Props> {
		self.set_field(key, Value::Bool(checked))
	}

	/// Set a select field; values outside its options are rejected
	pub fn set_select(&self, key: &str, value: &str) -> Option<Props> {
		self.set_field(key, Value::String(value.to_string()))
	}

	fn array_field(&self, key: &str) -> Option<FieldSchema> {
		self.field(key)
			.filter(|schema| matches!(schema.kind, FieldKind::Array { .. }))
	}

	fn current_items(&self, key: &str) -> Vec<Value> {
		match self.block.props.get(key) {
			Some(Value::Array(items)) => items.clone(),
			_ => Vec::new(),
		}
	}

	/// Append a copy of the array field's item template
	pub fn append_item(&self, key: &str) -> Option<Props> {
		let schema = self.array_field(key)?;
		let mut items = self.current_items(key);
		items.push(schema.new_item()?);
		Some(self.with_prop(key, Value::Array(items)))
	}

	/// Remove the item at `index`, closing the gap
	pub fn remove_item(&self, key: &str, index: usize) -> Option<Props> {
		self.array_field(key)?;
		let mut items = self.current_items(key);
		if index >= items.len() {
			return None;
		}
		items.remove(index);
		Some(self.with_prop(key, Value::Array(items)))
	}

	/// Set `item_key` inside the item at `index`
	///
	/// A non-object item is replaced by an object holding only the new value.
	pub fn set_item_field(&self, key: &str, index: usize, item_key: &str, value: Value) -> Option<Props> {
		let schema = self.array_field(key)?;
		let mut items = self.current_items(key);
		let item = items.get_mut(index)?;

		let current = item.get(item_key).filter(|current| !current.is_null());
		let item_schema = schema.item_field(item_key, current.unwrap_or(&value));
		let coerced = item_schema.coerce(&value)?;

		match item {
			Value::Object(object) => {
				object.insert(item_key.to_string(), coerced);
			}
			other => {
				let mut object = Map::new();
				object.insert(item_key.to_string(), coerced);
				*other = Value::Object(object);
			}
		}
		Some(self.with_prop(key, Value::Array(items)))
	}

	/// Required fields left empty and numbers outside their bounds
	///
	/// Advisory only; edits are never blocked on these.
	pub fn validate(&self) -> Vec<ValidationIssue> {
		let mut issues = Vec::new();
		for field in self.fields() {
			let label = field.label();
			let issue = |message: String| ValidationIssue {
				key: field.key.clone(),
				message,
			};

			if field.schema.required && field.schema.is_empty_value(field.value.as_ref()) {
				issues.push(issue(format!("{} is required", label)));
				continue;
			}
			if let FieldKind::Number { min, max } = &field.schema.kind {
				let Some(number) = field.value.as_ref().and_then(parse_integer) else {
					continue;
				};
				if let Some(min) = min.filter(|min| number < *min) {
					issues.push(issue(format!("{} must be at least {}", label, min)));
				} else if let Some(max) = max.filter(|max| number > *max) {
					issues.push(issue(format!("{} must be at most {}", label, max)));
				}
			}
		}
		issues
	}

	/// Form controls for every field
	pub fn render_html(&self) -> String {
		let mut html = format!(
			r#"<form class="kapwa-property-editor" data-block-id="{}" data-block-type="{}">"#,
			escape_html_attr(&self.block.id),
			escape_html_attr(&self.block.block_type)
		);
		html.push_str(&format!(
			r#"<h3 class="kapwa-property-editor__title">{}</h3>"#,
			escape_html(self.display_name())
		));
		for field in self.fields() {
			html.push_str(&render_field(
				&field.key,
				&field.label(),
				&field.schema,
				field.value.as_ref(),
			));
		}
		html.push_str("</form>");
		html
	}
}

fn field_label(key: &str, schema: &FieldSchema) -> String {
	if schema.label.trim().is_empty() {
		humanize_key(key)
	} else {
		schema.label.clone()
	}
}

fn field_id(name: &str) -> String {
	let id: String = name
		.chars()
		.map(|ch| if ch.is_alphanumeric() { ch } else { '-' })
		.collect();
	format!("field-{}", id.trim_end_matches('-'))
}

fn widget_value(schema: &FieldSchema, value: Option<&Value>) -> String {
	let value = value.unwrap_or(&Value::Null);
	match schema.kind {
		FieldKind::Number { .. } => coerce_integer(value).to_string(),
		FieldKind::Boolean => coerce_bool(value).to_string(),
		_ => value_to_text(value),
	}
}

fn render_field(name: &str, label: &str, schema: &FieldSchema, value: Option<&Value>) -> String {
	let Some((widget, mut attrs)) = widget_for(schema) else {
		return render_array(name, label, schema, value);
	};

	let id = field_id(name);
	attrs.insert("id".to_string(), id.clone());
	let current = widget_value(schema, value);
	let control = match &schema.kind {
		FieldKind::Select { options } => widget.render_with_choices(name, Some(&current), &attrs, options),
		_ => widget.render(name, Some(&current), &attrs),
	};
	let help = schema
		.description
		.as_deref()
		.map(|text| format!(r#"<p class="kapwa-field__help">{}</p>"#, escape_html(text)))
		.unwrap_or_default();

	format!(
		r#"<div class="kapwa-field kapwa-field--{}"><label for="{}">{}</label>{}{}</div>"#,
		schema.kind.name(),
		id,
		escape_html(label),
		help,
		control
	)
}

/// Item fields to show: the item schema when declared, else per-key inference
fn item_fields(schema: &FieldSchema, item: &Map<String, Value>) -> Vec<(String, FieldSchema)> {
	match &schema.kind {
		FieldKind::Array {
			item_schema: Some(item_schema),
			..
		} => item_schema
			.iter()
			.map(|(key, field)| (key.clone(), field.clone()))
			.collect(),
		_ => item
			.iter()
			.map(|(key, value)| (key.clone(), infer_field(key, value)))
			.collect(),
	}
}

fn render_array(name: &str, label: &str, schema: &FieldSchema, value: Option<&Value>) -> String {
	let FieldKind::Array { item_label, .. } = &schema.kind else {
		return String::new();
	};
	let noun = item_label.as_deref().unwrap_or("Item");
	let escaped_name = escape_html_attr(name);
	let items = value.and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default();

	let mut html = format!(
		r#"<fieldset class="kapwa-field kapwa-field--array" data-field="{}"><legend>{}</legend>"#,
		escaped_name,
		escape_html(label)
	);
	for (index, item) in items.iter().enumerate() {
		html.push_str(&format!(
			r#"<details class="kapwa-array__item" data-index="{index}" open><summary>Item {}</summary><button type="button" class="kapwa-array__remove" data-field="{escaped_name}" data-index="{index}">Remove</button>"#,
			index + 1
		));
		if let Some(object) = item.as_object() {
			for (item_key, item_schema) in item_fields(schema, object) {
				// Arrays do not nest inside items
				if matches!(item_schema.kind, FieldKind::Array { .. }) {
					continue;
				}
				html.push_str(&render_field(
					&format!("{}[{}][{}]", name, index, item_key),
					&field_label(&item_key, &item_schema),
					&item_schema,
					object.get(&item_key),
				));
			}
		}
		html.push_str("</details>");
	}
	html.push_str(&format!(
		r#"<button type="button" class="kapwa-array__add" data-field="{}">Add {}</button></fieldset>"#,
		escaped_name,
		escape_html(noun)
	));
	html
}
