//! Persisted client configuration.
//!
//! The file is a JSON object merged over [`AppConfig::default`]: missing keys
//! take their defaults, unknown keys are kept and written back untouched.
//! [`AppConfig::load_or_create`] never fails; problems are logged and the
//! defaults are used.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::error::ConfigLoadError;

const CONFIG_DIR: &str = "msgr";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
	pub auto_update: bool,
	pub mqtt: ReconnectConfig,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			auto_update: true,
			mqtt: ReconnectConfig::default(),
			extra: Map::new(),
		}
	}
}

/// Reconnect policy for the streaming connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconnectConfig {
	pub enabled: bool,
	/// Seconds between scheduled reconnects.
	pub reconnect_interval: u64,
}

impl Default for ReconnectConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			reconnect_interval: 3600,
		}
	}
}

impl ReconnectConfig {
	pub fn interval(&self) -> Duration {
		Duration::from_secs(self.reconnect_interval)
	}
}

impl AppConfig {
	/// `<config dir>/msgr/config.json`.
	pub fn default_path() -> Result<PathBuf, ConfigLoadError> {
		dirs::config_dir()
			.map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
			.ok_or(ConfigLoadError::NoConfigDir)
	}

	/// Reads and merges `path` over the defaults.
	pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
		let content = fs::read_to_string(path)?;
		Ok(serde_json::from_str(&content)?)
	}

	/// Loads `path`, writing the defaults there first when it does not exist.
	pub fn load_or_create(path: &Path) -> Self {
		if !path.exists() {
			let config = Self::default();
			match config.save(path) {
				Ok(()) => debug!(target = "msgr.config", path = %path.display(), "wrote default config"),
				Err(err) => error!(target = "msgr.config", path = %path.display(), error = %err, "failed to write default config"),
			}
			return config;
		}

		Self::load(path).unwrap_or_else(|err| {
			error!(target = "msgr.config", path = %path.display(), error = %err, "failed to load config; using defaults");
			Self::default()
		})
	}

	pub fn save(&self, path: &Path) -> Result<(), ConfigLoadError> {
		if let Some(parent) = path.parent() {
			if !parent.as_os_str().is_empty() {
				fs::create_dir_all(parent)?;
			}
		}
		let json = serde_json::to_string_pretty(self)?;
		fs::write(path, json)?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use tempfile::TempDir;

	use super::*;

	#[test]
	fn missing_file_is_created_with_defaults() {
		let temp = TempDir::new().unwrap();
		let path = temp.path().join("nested").join("config.json");

		let config = AppConfig::load_or_create(&path);
		assert_eq!(config, AppConfig::default());
		assert!(path.exists());

		let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
		assert_eq!(written["autoUpdate"], true);
		assert_eq!(written["mqtt"]["enabled"], true);
		assert_eq!(written["mqtt"]["reconnectInterval"], 3600);
	}

	#[test]
	fn partial_file_merges_over_defaults() {
		let temp = TempDir::new().unwrap();
		let path = temp.path().join("config.json");
		fs::write(&path, r#"{"mqtt": {"reconnectInterval": 60}, "theme": "dark"}"#).unwrap();

		let config = AppConfig::load_or_create(&path);
		assert!(config.auto_update);
		assert!(config.mqtt.enabled);
		assert_eq!(config.mqtt.interval(), Duration::from_secs(60));
		assert_eq!(config.extra.get("theme"), Some(&Value::from("dark")));
	}

	#[test]
	fn unparsable_file_falls_back_to_defaults_without_overwriting() {
		let temp = TempDir::new().unwrap();
		let path = temp.path().join("config.json");
		fs::write(&path, "{ broken").unwrap();

		assert_eq!(AppConfig::load_or_create(&path), AppConfig::default());
		assert!(matches!(AppConfig::load(&path), Err(ConfigLoadError::Parse(_))));
		assert_eq!(fs::read_to_string(&path).unwrap(), "{ broken");
	}

	#[test]
	fn unknown_keys_survive_a_save() {
		let temp = TempDir::new().unwrap();
		let path = temp.path().join("config.json");
		fs::write(&path, r#"{"autoUpdate": false, "customKey": [1, 2]}"#).unwrap();

		let config = AppConfig::load(&path).unwrap();
		config.save(&path).unwrap();
		let reloaded = AppConfig::load(&path).unwrap();
		assert!(!reloaded.auto_update);
		assert_eq!(reloaded.extra.get("customKey"), Some(&serde_json::json!([1, 2])));
	}
}
