//! Service configuration.
//!
//! A deployment is described by one TOML file, optionally split with
//! `include = ["storage.toml", ...]`; no top-level section may appear in more
//! than one file. `${VAR}` and `${VAR:-fallback}` are expanded from the
//! environment before parsing, and the parsed [`Config`] is validated as a
//! whole before anything is built from it.

mod loader;

pub use loader::ConfigLoader;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
	/// A configuration file could not be found or read.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// The text is not valid TOML for [`Config`].
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Parsed, but a value is out of range or inconsistent.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// The full error embeds the whole input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Root of the service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity of this service instance.
	pub service: ServiceConfig,
	/// Backends and which one holds the records.
	pub storage: StorageConfig,
	/// Change notification settings.
	#[serde(default)]
	pub notifier: NotifierConfig,
	/// Manufacturer matching settings.
	#[serde(default)]
	pub matching: MatchingConfig,
	/// HTTP surface; absent means defaults.
	pub api: Option<ApiConfig>,
}

/// Configuration specific to the service instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	/// Unique identifier for this instance, used in logs.
	pub id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Name of the backend records are written to.
	pub primary: String,
	/// Per-backend tables keyed by backend name.
	pub implementations: HashMap<String, toml::Value>,
}

/// Change notifier settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotifierConfig {
	/// Events buffered per subscriber before it is considered lagging.
	#[serde(default = "default_channel_capacity")]
	pub channel_capacity: usize,
}

impl Default for NotifierConfig {
	fn default() -> Self {
		Self {
			channel_capacity: default_channel_capacity(),
		}
	}
}

fn default_channel_capacity() -> usize {
	1024
}

/// Manufacturer matching settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatchingConfig {
	/// Push candidates that miss a hard requirement to the bottom of the ranking.
	#[serde(default)]
	pub strict_filters: bool,
	/// Maximum manufacturers a single send-requests call may target.
	#[serde(default = "default_max_requests")]
	pub max_requests: usize,
}

impl Default for MatchingConfig {
	fn default() -> Self {
		Self {
			strict_filters: false,
			max_requests: default_max_requests(),
		}
	}
}

fn default_max_requests() -> usize {
	10
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	#[serde(default)]
	pub enabled: bool,
	#[serde(default = "default_api_host")]
	pub host: String,
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Per-request deadline; event streams are exempt.
	#[serde(default = "default_api_timeout")]
	pub timeout_seconds: u64,
	/// Largest accepted request body, in bytes.
	#[serde(default = "default_max_request_size")]
	pub max_request_size: usize,
	/// Origins allowed by CORS; permissive when absent.
	pub cors: Option<CorsConfig>,
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			host: default_api_host(),
			port: default_api_port(),
			timeout_seconds: default_api_timeout(),
			max_request_size: default_max_request_size(),
			cors: None,
		}
	}
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
	pub allowed_origins: Vec<String>,
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	3000
}

fn default_api_timeout() -> u64 {
	30
}

fn default_max_request_size() -> usize {
	1024 * 1024 // 1MB
}

/// Expands `${NAME}` and `${NAME:-fallback}` placeholders.
///
/// An unset variable without a fallback is an error. Inputs above 1MB are
/// refused before the regex runs.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration is {} bytes, limit is {}",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("placeholder pattern: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match (std::env::var(var_name.as_str()), default_value) {
			(Ok(v), _) => v,
			(Err(_), Some(default)) => default.to_string(),
			(Err(_), None) => {
				return Err(ConfigError::Validation(format!(
					"Environment variable '{}' not found",
					var_name.as_str()
				)));
			},
		};

		result.push_str(&input[last..full_match.start()]);
		result.push_str(&value);
		last = full_match.end();
	}
	result.push_str(&input[last..]);

	Ok(result)
}

impl Config {
	/// Reads `path` and the files it includes, resolved next to it.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let entry = Path::new(path);
		let Some(file_name) = entry.file_name() else {
			return Err(ConfigError::Validation(format!(
				"{} does not name a file",
				path
			)));
		};
		let dir = match entry.parent() {
			Some(parent) if !parent.as_os_str().is_empty() => parent,
			_ => Path::new("."),
		};
		ConfigLoader::new(dir).load_config(file_name).await
	}

	/// The API section, or the defaults when it is absent.
	pub fn api_or_default(&self) -> ApiConfig {
		self.api.clone().unwrap_or_default()
	}

	fn validate(&self) -> Result<(), ConfigError> {
		ensure(!self.service.id.trim().is_empty(), || {
			"service.id cannot be empty".into()
		})?;
		self.validate_storage()?;

		let capacity = self.notifier.channel_capacity;
		ensure((1..=65536).contains(&capacity), || {
			format!("notifier.channel_capacity must be in 1..=65536, got {}", capacity)
		})?;
		let max_requests = self.matching.max_requests;
		ensure((1..=100).contains(&max_requests), || {
			format!("matching.max_requests must be in 1..=100, got {}", max_requests)
		})?;

		match &self.api {
			Some(api) if api.enabled => {
				ensure(!api.host.trim().is_empty(), || "api.host cannot be empty".into())?;
				ensure(api.timeout_seconds > 0, || {
					"api.timeout_seconds must be greater than 0".into()
				})
			},
			_ => Ok(()),
		}
	}

	fn validate_storage(&self) -> Result<(), ConfigError> {
		let storage = &self.storage;
		ensure(!storage.implementations.is_empty(), || {
			"storage.implementations needs at least one backend".into()
		})?;
		ensure(!storage.primary.is_empty(), || {
			"storage.primary cannot be empty".into()
		})?;
		ensure(storage.implementations.contains_key(&storage.primary), || {
			format!(
				"Primary storage '{}' has no [storage.implementations.{}] table",
				storage.primary, storage.primary
			)
		})
	}
}

fn ensure(ok: bool, message: impl FnOnce() -> String) -> Result<(), ConfigError> {
	if ok {
		Ok(())
	} else {
		Err(ConfigError::Validation(message()))
	}
}

impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let config: Config = toml::from_str(&resolve_env_vars(s)?)?;
		config.validate()?;
		Ok(config)
	}
}
