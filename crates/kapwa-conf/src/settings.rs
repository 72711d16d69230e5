//! Page builder settings

use crate::builder::{SettingsBuilder, SettingsError};
use crate::sources::{DefaultSource, EnvSource, auto_source};
use kapwa_core::security::{HtmlSanitizer, SanitizerPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for the whole page builder
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PageBuilderSettings {
	/// Allow-lists applied to rich text
	pub sanitizer: SanitizerPolicy,
	/// Document editor behaviour
	pub editor: EditorSettings,
	/// Renderer output
	pub renderer: RendererSettings,
}

/// Document editor settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
	/// Undo states kept per editing session; `0` disables undo
	pub history_limit: usize,
	/// Characters of rich text shown in block previews
	pub preview_length: usize,
}

impl Default for EditorSettings {
	fn default() -> Self {
		Self {
			history_limit: 100,
			preview_length: 100,
		}
	}
}

/// Renderer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
	/// Class of the element wrapping rendered blocks
	pub container_class: String,
}

impl Default for RendererSettings {
	fn default() -> Self {
		Self {
			container_class: "kapwa-blocks".to_string(),
		}
	}
}

impl PageBuilderSettings {
	/// Load settings from defaults, an optional config file and `KAPWA_*`
	/// environment variables
	///
	/// A missing config file is treated as empty.
	pub fn load(config_file: Option<&Path>) -> Result<Self, SettingsError> {
		Self::builder(config_file, EnvSource::new())?.build()
	}

	/// Builder preloaded with the default layers
	///
	/// # Examples
	///
	/// ```
	/// use kapwa_conf::PageBuilderSettings;
	/// use kapwa_conf::sources::EnvSource;
	///
	/// let env = EnvSource::new().with_vars([("KAPWA_SANITIZER__ALLOWED_TAGS", "p,a")]);
	/// let settings: PageBuilderSettings = PageBuilderSettings::builder(None, env)
	///     .unwrap()
	///     .build()
	///     .unwrap();
	/// assert_eq!(settings.sanitizer.allowed_tags, vec!["p", "a"]);
	/// ```
	pub fn builder(config_file: Option<&Path>, env: EnvSource) -> Result<SettingsBuilder, SettingsError> {
		let defaults = serde_json::to_value(Self::default())?;
		let defaults = DefaultSource::from_object(defaults).map_err(|error| SettingsError::Source {
			source_name: "Default values".to_string(),
			error,
		})?;

		let mut builder = SettingsBuilder::new().add_source(defaults);
		if let Some(path) = config_file {
			let file_source = auto_source(path).map_err(|error| SettingsError::Source {
				source_name: path.display().to_string(),
				error,
			})?;
			builder = builder.add_boxed_source(file_source);
		}
		Ok(builder.add_source(env))
	}

	/// Build the sanitizer described by these settings
	pub fn sanitizer(&self) -> Result<HtmlSanitizer, SettingsError> {
		Ok(HtmlSanitizer::from_policy(&self.sanitizer)?)
	}
}
