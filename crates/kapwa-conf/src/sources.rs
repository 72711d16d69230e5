//! Configuration sources for layered settings
//!
//! Each source yields a map of top-level keys to JSON values. The
//! [`SettingsBuilder`](crate::builder::SettingsBuilder) merges them by
//! ascending priority.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Separator for nested keys in environment variable names
pub const ENV_NESTING_SEPARATOR: &str = "__";

/// Default environment variable prefix
pub const DEFAULT_ENV_PREFIX: &str = "KAPWA_";

/// Trait for configuration sources
pub trait ConfigSource: Send + Sync {
	/// Load configuration from this source
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError>;

	/// Get the priority of this source (higher = more important)
	fn priority(&self) -> u8;

	/// Get a description of this source
	fn description(&self) -> String;
}

/// Error type for configuration sources
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
	/// Source file could not be read
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// Value could not be parsed
	#[error("Parse error: {0}")]
	Parse(String),

	/// Malformed TOML file
	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	/// Malformed JSON file
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// Source is not usable, e.g. an unsupported file extension
	#[error("Invalid source: {0}")]
	InvalidSource(String),
}

/// Environment variable configuration source
///
/// `KAPWA_EDITOR__HISTORY_LIMIT=5` becomes `{"editor": {"history_limit": 5}}`.
pub struct EnvSource {
	prefix: String,
	vars: Option<Vec<(String, String)>>,
}

impl EnvSource {
	/// Create a source reading variables that start with `KAPWA_`
	///
	/// # Examples
	///
	/// ```
	/// use kapwa_conf::sources::{ConfigSource, EnvSource};
	///
	/// let source = EnvSource::new();
	/// assert_eq!(source.priority(), 100);
	/// ```
	pub fn new() -> Self {
		Self {
			prefix: DEFAULT_ENV_PREFIX.to_string(),
			vars: None,
		}
	}

	/// Replace the prefix filter
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = prefix.into();
		self
	}

	/// Read from a fixed list of variables instead of the process environment
	///
	/// # Examples
	///
	/// ```
	/// use kapwa_conf::sources::{ConfigSource, EnvSource};
	/// use serde_json::json;
	///
	/// let source = EnvSource::new().with_vars([("KAPWA_EDITOR__HISTORY_LIMIT", "5")]);
	/// let config = source.load().unwrap();
	/// assert_eq!(config["editor"], json!({"history_limit": 5}));
	/// ```
	pub fn with_vars<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
	where
		K: Into<String>,
		V: Into<String>,
	{
		self.vars = Some(
			vars.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		);
		self
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for EnvSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		let vars = match &self.vars {
			Some(vars) => vars.clone(),
			None => std::env::vars().collect(),
		};

		let mut config: IndexMap<String, Value> = IndexMap::new();
		for (key, value) in vars {
			let Some(clean_key) = key.strip_prefix(&self.prefix) else {
				continue;
			};
			let lower_key = clean_key.to_lowercase();
			let mut path = lower_key
				.split(ENV_NESTING_SEPARATOR)
				.filter(|segment| !segment.is_empty());
			let Some(head) = path.next() else {
				continue;
			};
			let rest: Vec<&str> = path.collect();

			let parsed_value = parse_scalar(&value);
			if rest.is_empty() {
				config.insert(head.to_string(), parsed_value);
				continue;
			}

			let entry = config
				.entry(head.to_string())
				.or_insert_with(|| Value::Object(Map::new()));
			insert_nested(entry, &rest, parsed_value);
		}

		Ok(config)
	}

	fn priority(&self) -> u8 {
		100 // Highest priority
	}

	fn description(&self) -> String {
		format!("Environment variables (prefix: {})", self.prefix)
	}
}

/// Integer, then boolean, then string
fn parse_scalar(value: &str) -> Value {
	let trimmed = value.trim();
	if let Ok(num) = trimmed.parse::<i64>() {
		Value::Number(num.into())
	} else if let Ok(b) = trimmed.to_lowercase().parse::<bool>() {
		Value::Bool(b)
	} else {
		Value::String(value.to_string())
	}
}

fn insert_nested(target: &mut Value, path: &[&str], value: Value) {
	if !target.is_object() {
		*target = Value::Object(Map::new());
	}
	let Value::Object(map) = target else {
		return;
	};
	match path {
		[] => {}
		[last] => {
			map.insert(last.to_string(), value);
		}
		[head, rest @ ..] => {
			let child = map
				.entry(head.to_string())
				.or_insert_with(|| Value::Object(Map::new()));
			insert_nested(child, rest, value);
		}
	}
}

/// TOML file configuration source
///
/// A missing file loads as an empty map.
pub struct TomlFileSource {
	path: PathBuf,
}

impl TomlFileSource {
	/// Create a new TOML file configuration source
	///
	/// # Examples
	///
	/// ```
	/// use kapwa_conf::sources::TomlFileSource;
	///
	/// let source = TomlFileSource::new("kapwa.toml");
	/// ```
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for TomlFileSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		if !self.path.exists() {
			return Ok(IndexMap::new());
		}

		let content = fs::read_to_string(&self.path)?;
		let toml_value: toml::Value = toml::from_str(&content)?;
		let json_value = serde_json::to_value(toml_value)?;

		object_to_map(json_value)
	}

	fn priority(&self) -> u8 {
		50
	}

	fn description(&self) -> String {
		format!("TOML file: {}", self.path.display())
	}
}

/// JSON file configuration source
pub struct JsonFileSource {
	path: PathBuf,
}

impl JsonFileSource {
	/// Create a new JSON file configuration source
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for JsonFileSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		if !self.path.exists() {
			return Ok(IndexMap::new());
		}

		let content = fs::read_to_string(&self.path)?;
		let json_value: Value = serde_json::from_str(&content)?;

		object_to_map(json_value)
	}

	fn priority(&self) -> u8 {
		50
	}

	fn description(&self) -> String {
		format!("JSON file: {}", self.path.display())
	}
}

fn object_to_map(value: Value) -> Result<IndexMap<String, Value>, SourceError> {
	match value {
		Value::Object(map) => Ok(map.into_iter().collect()),
		_ => Err(SourceError::Parse("Expected object at root".to_string())),
	}
}

/// Default values configuration source
pub struct DefaultSource {
	values: IndexMap<String, Value>,
}

impl DefaultSource {
	/// Create an empty default source
	pub fn new() -> Self {
		Self {
			values: IndexMap::new(),
		}
	}

	/// Add a default value for a top-level key
	///
	/// # Examples
	///
	/// ```
	/// use kapwa_conf::sources::{ConfigSource, DefaultSource};
	/// use serde_json::json;
	///
	/// let source = DefaultSource::new().with_value("renderer", json!({"container_class": "page"}));
	/// assert_eq!(source.load().unwrap()["renderer"]["container_class"], "page");
	/// ```
	pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
		self.values.insert(key.into(), value);
		self
	}

	/// Seed every top-level key of a serialized object
	pub fn from_object(value: Value) -> Result<Self, SourceError> {
		Ok(Self {
			values: object_to_map(value)?,
		})
	}
}

impl Default for DefaultSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for DefaultSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		Ok(self.values.clone())
	}

	fn priority(&self) -> u8 {
		0 // Lowest priority
	}

	fn description(&self) -> String {
		"Default values".to_string()
	}
}

/// Pick a file source from the path extension
///
/// # Examples
///
/// ```
/// use kapwa_conf::sources::auto_source;
///
/// assert!(auto_source("kapwa.toml").is_ok());
/// assert!(auto_source("kapwa.json").is_ok());
/// assert!(auto_source("kapwa.ini").is_err());
/// ```
pub fn auto_source(path: impl AsRef<Path>) -> Result<Box<dyn ConfigSource>, SourceError> {
	let path = path.as_ref();
	let ext = path
		.extension()
		.and_then(|e| e.to_str())
		.ok_or_else(|| SourceError::InvalidSource("No file extension".to_string()))?;

	match ext {
		"toml" => Ok(Box::new(TomlFileSource::new(path))),
		"json" => Ok(Box::new(JsonFileSource::new(path))),
		other => Err(SourceError::InvalidSource(format!(
			"Unsupported file extension: {}",
			other
		))),
	}
}
