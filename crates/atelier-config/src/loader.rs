//! Multi-file configuration loading.
//!
//! The entry file may name further files under `include`. Included files are
//! read once each, may not include others, and must not redefine a top-level
//! section already supplied elsewhere.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

const INCLUDE_KEY: &str = "include";

/// One parsed file and the sections it contributes.
struct Fragment {
	origin: PathBuf,
	table: toml::Table,
}

/// Reads an entry configuration file together with its includes.
pub struct ConfigLoader {
	base_dir: PathBuf,
	seen: HashSet<PathBuf>,
}

impl ConfigLoader {
	pub fn new(base_dir: impl AsRef<Path>) -> Self {
		Self {
			base_dir: base_dir.as_ref().to_path_buf(),
			seen: HashSet::new(),
		}
	}

	/// Loads `entry` (relative to the base directory unless absolute), merges
	/// every included file into it and validates the result.
	pub async fn load_config(&mut self, entry: impl AsRef<Path>) -> Result<Config, ConfigError> {
		let mut root = self.read_fragment(entry.as_ref()).await?;
		let includes = match root.table.remove(INCLUDE_KEY) {
			Some(value) => include_list(&value)?,
			None => Vec::new(),
		};

		let mut fragments = Vec::with_capacity(includes.len());
		for include in &includes {
			let fragment = self.read_fragment(include).await?;
			if fragment.table.contains_key(INCLUDE_KEY) {
				return Err(ConfigError::Validation(format!(
					"Nested include in {} is not supported",
					fragment.origin.display()
				)));
			}
			fragments.push(fragment);
		}

		let merged = merge(root, fragments)?;
		let rendered = toml::to_string(&merged)
			.map_err(|e| ConfigError::Parse(format!("Failed to render merged config: {}", e)))?;
		rendered.parse()
	}

	async fn read_fragment(&mut self, path: &Path) -> Result<Fragment, ConfigError> {
		let candidate = if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.base_dir.join(path)
		};

		let origin = tokio::fs::canonicalize(&candidate).await.map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Configuration file not found: {} ({})", candidate.display(), e),
			))
		})?;
		if !self.seen.insert(origin.clone()) {
			return Err(ConfigError::Validation(format!(
				"Circular include: {} was already loaded",
				origin.display()
			)));
		}

		let raw = tokio::fs::read_to_string(&origin).await?;
		let table: toml::Table = toml::from_str(&resolve_env_vars(&raw)?)?;
		Ok(Fragment { origin, table })
	}
}

fn include_list(value: &toml::Value) -> Result<Vec<PathBuf>, ConfigError> {
	match value {
		toml::Value::String(single) => Ok(vec![PathBuf::from(single)]),
		toml::Value::Array(items) => items
			.iter()
			.map(|item| {
				item.as_str().map(PathBuf::from).ok_or_else(|| {
					ConfigError::Validation("include entries must be strings".into())
				})
			})
			.collect(),
		_ => Err(ConfigError::Validation(
			"include must be a string or an array of strings".into(),
		)),
	}
}

/// Folds included fragments into the root, rejecting redefined sections.
fn merge(root: Fragment, fragments: Vec<Fragment>) -> Result<toml::Table, ConfigError> {
	let mut owners: BTreeMap<String, PathBuf> = root
		.table
		.keys()
		.map(|key| (key.clone(), root.origin.clone()))
		.collect();
	let mut merged = root.table;

	for fragment in fragments {
		for (section, value) in fragment.table {
			if let Some(owner) = owners.get(&section) {
				return Err(ConfigError::Validation(format!(
					"Duplicate section '{}' found in {} and {}",
					section,
					owner.display(),
					fragment.origin.display()
				)));
			}
			owners.insert(section.clone(), fragment.origin.clone());
			merged.insert(section, value);
		}
	}

	Ok(merged)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::TempDir;

	#[tokio::test]
	async fn test_single_file_config() {
		let temp_dir = TempDir::new().unwrap();
		let config_path = temp_dir.path().join("config.toml");

		let config_content = r#"
[service]
id = "atelier-single"

[storage]
primary = "file"
[storage.implementations.file]
storage_path = "./data/storage"

[api]
enabled = true
port = 4000
"#;

		fs::write(&config_path, config_content).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let config = loader.load_config(&config_path).await.unwrap();

		assert_eq!(config.service.id, "atelier-single");
		assert_eq!(config.storage.primary, "file");
		assert_eq!(config.api.unwrap().port, 4000);
	}

	#[tokio::test]
	async fn test_config_with_includes() {
		let temp_dir = TempDir::new().unwrap();

		let main_config = r#"
include = ["storage.toml", "api.toml"]
[service]
id = "atelier-modular"
"#;

		let storage_config = r#"
[storage]
primary = "memory"
[storage.implementations.memory]
"#;

		let api_config = r#"
[api]
enabled = true
host = "0.0.0.0"

[matching]
strict_filters = true
"#;

		fs::write(temp_dir.path().join("main.toml"), main_config).unwrap();
		fs::write(temp_dir.path().join("storage.toml"), storage_config).unwrap();
		fs::write(temp_dir.path().join("api.toml"), api_config).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let config = loader.load_config("main.toml").await.unwrap();

		assert_eq!(config.service.id, "atelier-modular");
		assert_eq!(config.storage.primary, "memory");
		assert_eq!(config.api.unwrap().host, "0.0.0.0");
		assert!(config.matching.strict_filters);
	}

	#[tokio::test]
	async fn test_duplicate_section_error() {
		let temp_dir = TempDir::new().unwrap();

		let main_config = r#"
include = ["duplicate.toml"]

[service]
id = "atelier-one"
"#;

		let duplicate_config = r#"
[service]
id = "atelier-two"
"#;

		fs::write(temp_dir.path().join("main.toml"), main_config).unwrap();
		fs::write(temp_dir.path().join("duplicate.toml"), duplicate_config).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let result = loader.load_config("main.toml").await;

		let error_msg = result.unwrap_err().to_string();
		assert!(error_msg.contains("Duplicate section 'service'"));
	}

	#[tokio::test]
	async fn test_self_include_detection() {
		let temp_dir = TempDir::new().unwrap();

		let config = r#"
include = ["self.toml"]

[service]
id = "atelier-loop"
"#;

		fs::write(temp_dir.path().join("self.toml"), config).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let result = loader.load_config("self.toml").await;

		let error_msg = result.unwrap_err().to_string();
		assert!(error_msg.contains("already loaded"));
	}

	#[tokio::test]
	async fn test_missing_include_file() {
		let temp_dir = TempDir::new().unwrap();
		fs::write(
			temp_dir.path().join("main.toml"),
			"include = \"nope.toml\"\n[service]\nid = \"x\"\n",
		)
		.unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let result = loader.load_config("main.toml").await;
		assert!(matches!(result, Err(ConfigError::Io(_))));
	}

	#[tokio::test]
	async fn test_from_file_uses_parent_directory() {
		let temp_dir = TempDir::new().unwrap();
		fs::write(
			temp_dir.path().join("storage.toml"),
			"[storage]\nprimary = \"memory\"\n[storage.implementations.memory]\n",
		)
		.unwrap();
		let main = temp_dir.path().join("config.toml");
		fs::write(&main, "include = [\"storage.toml\"]\n[service]\nid = \"atelier-ff\"\n").unwrap();

		let config = Config::from_file(main.to_str().unwrap()).await.unwrap();
		assert_eq!(config.service.id, "atelier-ff");
	}
}
