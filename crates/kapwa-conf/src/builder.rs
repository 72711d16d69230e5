//! Merge configuration sources into typed settings

use crate::sources::{ConfigSource, SourceError};
use kapwa_core::security::SanitizerError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Errors raised while building settings
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	/// A source failed to load
	#[error("Failed to load {source_name}: {error}")]
	Source {
		/// Description of the failing source
		source_name: String,
		/// Underlying error
		error: SourceError,
	},

	/// The merged values do not match the settings type
	#[error("Invalid settings: {0}")]
	Deserialize(#[from] serde_json::Error),

	/// The configured sanitizer allow-list is unsafe
	#[error("Invalid sanitizer policy: {0}")]
	Sanitizer(#[from] SanitizerError),
}

/// Layered settings builder
///
/// Sources are applied by ascending priority; among equal priorities, the
/// later-added source wins.
#[derive(Default)]
pub struct SettingsBuilder {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl SettingsBuilder {
	/// Create a builder with no sources
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a source
	pub fn add_source<S: ConfigSource + 'static>(mut self, source: S) -> Self {
		self.sources.push(Box::new(source));
		self
	}

	/// Add an already boxed source
	pub fn add_boxed_source(mut self, source: Box<dyn ConfigSource>) -> Self {
		self.sources.push(source);
		self
	}

	/// Merge every source into one JSON object
	///
	/// # Examples
	///
	/// ```
	/// use kapwa_conf::builder::SettingsBuilder;
	/// use kapwa_conf::sources::{DefaultSource, EnvSource};
	/// use serde_json::json;
	///
	/// let merged = SettingsBuilder::new()
	///     .add_source(EnvSource::new().with_vars([("KAPWA_EDITOR__HISTORY_LIMIT", "3")]))
	///     .add_source(DefaultSource::new().with_value("editor", json!({"history_limit": 100, "preview_length": 80})))
	///     .build_value()
	///     .unwrap();
	/// assert_eq!(merged, json!({"editor": {"history_limit": 3, "preview_length": 80}}));
	/// ```
	pub fn build_value(&self) -> Result<Value, SettingsError> {
		let mut ordered: Vec<&dyn ConfigSource> = self.sources.iter().map(|s| s.as_ref()).collect();
		ordered.sort_by_key(|source| source.priority());

		let mut merged = Value::Object(Map::new());
		for source in ordered {
			let values = source.load().map_err(|error| SettingsError::Source {
				source_name: source.description(),
				error,
			})?;
			tracing::debug!(
				source = %source.description(),
				keys = values.len(),
				"loaded configuration source"
			);
			let overlay = Value::Object(values.into_iter().collect());
			merge_value(&mut merged, overlay);
		}
		Ok(merged)
	}

	/// Merge every source and deserialize the result
	pub fn build<T: DeserializeOwned>(&self) -> Result<T, SettingsError> {
		let merged = self.build_value()?;
		Ok(serde_json::from_value(merged)?)
	}
}

/// Deep-merge `overlay` into `base`
///
/// Objects merge key by key. A string landing on an array splits on commas,
/// so list settings can be overridden from a single environment variable.
pub fn merge_value(base: &mut Value, overlay: Value) {
	match overlay {
		Value::Object(overlay_map) if base.is_object() => {
			let Value::Object(base_map) = base else {
				return;
			};
			for (key, value) in overlay_map {
				match base_map.get_mut(&key) {
					Some(existing) => merge_value(existing, value),
					None => {
						base_map.insert(key, value);
					}
				}
			}
		}
		Value::String(list) if base.is_array() => {
			*base = Value::Array(
				list.split(',')
					.map(str::trim)
					.filter(|item| !item.is_empty())
					.map(|item| Value::String(item.to_string()))
					.collect(),
			);
		}
		overlay => *base = overlay,
	}
}
