//! Typed reads over a block's property bag

use super::{Props, RenderError};
use crate::schema::{coerce_bool, parse_integer, value_to_text};
use kapwa_core::security::escape_html;
use serde_json::Value;

/// Lenient accessors for [`Props`]
///
/// Props come from stored JSON and may hold anything. These readers never
/// fail on a wrong shape; they fall back to an empty or default value.
pub trait PropAccess {
	/// Text of `key`, empty when absent
	fn text(&self, key: &str) -> String;

	/// Text of `key`, `default` when absent or blank
	fn text_or(&self, key: &str, default: &str) -> String;

	/// HTML-escaped text of `key`
	fn text_escaped(&self, key: &str) -> String {
		escape_html(&self.text(key))
	}

	/// Non-blank text of `key`
	fn required_text(&self, key: &str) -> Result<String, RenderError>;

	/// Integer reading of `key`, `default` when it has none
	fn integer(&self, key: &str, default: i64) -> i64;

	/// Boolean reading of `key`, `default` when absent
	fn flag(&self, key: &str, default: bool) -> bool;

	/// Object items of the array at `key`, skipping anything else
	fn items(&self, key: &str) -> Vec<&Props>;
}

impl PropAccess for Props {
	fn text(&self, key: &str) -> String {
		self.get(key).map(value_to_text).unwrap_or_default()
	}

	fn text_or(&self, key: &str, default: &str) -> String {
		let text = self.text(key);
		if text.trim().is_empty() {
			default.to_string()
		} else {
			text
		}
	}

	fn required_text(&self, key: &str) -> Result<String, RenderError> {
		let text = self.text(key);
		if text.trim().is_empty() {
			return Err(RenderError::MissingField(key.to_string()));
		}
		Ok(text)
	}

	fn integer(&self, key: &str, default: i64) -> i64 {
		self.get(key).and_then(parse_integer).unwrap_or(default)
	}

	fn flag(&self, key: &str, default: bool) -> bool {
		match self.get(key) {
			None | Some(Value::Null) => default,
			Some(value) => coerce_bool(value),
		}
	}

	fn items(&self, key: &str) -> Vec<&Props> {
		match self.get(key) {
			Some(Value::Array(items)) => items.iter().filter_map(Value::as_object).collect(),
			_ => Vec::new(),
		}
	}
}
