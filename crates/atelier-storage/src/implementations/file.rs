//! File-based storage backend.
//!
//! One JSON file per key under a base directory. Key characters outside
//! `[A-Za-z0-9._-]` are percent-encoded in file names so keys can be
//! recovered when scanning. Writes go to a unique temp file first and are
//! then renamed (overwrite) or hard-linked (create-if-absent) into place, so
//! readers never observe a partially written value.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use atelier_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, SchemaError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;

const EXTENSION: &str = "json";
const DEFAULT_STORAGE_PATH: &str = "./data/storage";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

fn encode_key(key: &str) -> String {
	let mut out = String::with_capacity(key.len());
	for byte in key.bytes() {
		match byte {
			b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'_' | b'-' => out.push(byte as char),
			_ => out.push_str(&format!("%{:02X}", byte)),
		}
	}
	out
}

fn decode_key(name: &str) -> Option<String> {
	let bytes = name.as_bytes();
	let mut out = Vec::with_capacity(bytes.len());
	let mut i = 0;
	while i < bytes.len() {
		if bytes[i] == b'%' {
			let hex = name.get(i + 1..i + 3)?;
			out.push(u8::from_str_radix(hex, 16).ok()?);
			i += 3;
		} else {
			out.push(bytes[i]);
			i += 1;
		}
	}
	String::from_utf8(out).ok()
}

fn backend_err(e: std::io::Error) -> StorageError {
	StorageError::Backend(e.to_string())
}

/// File-based storage implementation.
pub struct FileStorage {
	/// Base directory path for storing files.
	base_path: PathBuf,
}

impl FileStorage {
	/// Creates a new FileStorage instance rooted at `base_path`.
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path }
	}

	fn file_path(&self, key: &str) -> PathBuf {
		self.base_path
			.join(format!("{}.{}", encode_key(key), EXTENSION))
	}

	/// Writes `value` to a fresh temp file in the base directory.
	async fn write_temp(&self, value: &[u8]) -> Result<PathBuf, StorageError> {
		fs::create_dir_all(&self.base_path)
			.await
			.map_err(backend_err)?;
		let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
		let temp_path = self
			.base_path
			.join(format!(".tmp-{}-{}", std::process::id(), n));
		fs::write(&temp_path, value).await.map_err(backend_err)?;
		Ok(temp_path)
	}

	async fn discard_temp(path: &Path) {
		if let Err(e) = fs::remove_file(path).await {
			tracing::warn!("Failed to remove temp file {:?}: {}", path, e);
		}
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		match fs::read(self.file_path(key)).await {
			Ok(data) => Ok(data),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
			Err(e) => Err(backend_err(e)),
		}
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let temp_path = self.write_temp(&value).await?;
		if let Err(e) = fs::rename(&temp_path, self.file_path(key)).await {
			Self::discard_temp(&temp_path).await;
			return Err(backend_err(e));
		}
		Ok(())
	}

	async fn set_bytes_if_absent(&self, key: &str, value: Vec<u8>) -> Result<bool, StorageError> {
		let temp_path = self.write_temp(&value).await?;
		// hard_link fails with AlreadyExists instead of replacing the target
		let result = fs::hard_link(&temp_path, self.file_path(key)).await;
		Self::discard_temp(&temp_path).await;
		match result {
			Ok(()) => Ok(true),
			Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
			Err(e) => Err(backend_err(e)),
		}
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		match fs::remove_file(self.file_path(key)).await {
			Ok(_) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(backend_err(e)),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		fs::try_exists(self.file_path(key)).await.map_err(backend_err)
	}

	async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StorageError> {
		let mut entries = match fs::read_dir(&self.base_path).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(backend_err(e)),
		};

		let mut found = Vec::new();
		while let Some(entry) = entries.next_entry().await.map_err(backend_err)? {
			let path = entry.path();
			if path.extension() != Some(std::ffi::OsStr::new(EXTENSION)) {
				continue;
			}
			let Some(key) = path
				.file_stem()
				.and_then(|stem| stem.to_str())
				.and_then(decode_key)
			else {
				tracing::debug!("Skipping file {:?}: not a storage key", path);
				continue;
			};
			if !key.starts_with(prefix) {
				continue;
			}
			match fs::read(&path).await {
				Ok(data) => found.push((key, data)),
				// Deleted between listing and reading
				Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
				Err(e) => return Err(backend_err(e)),
			}
		}
		found.sort_by(|a, b| a.0.cmp(&b.0));
		Ok(found)
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), SchemaError> {
		let schema = Schema::new(
			vec![],
			vec![Field::new("storage_path", FieldType::String).with_validator(|value| {
				match value.as_str() {
					Some(path) if path.trim().is_empty() => {
						Err("storage_path cannot be empty".to_string())
					},
					_ => Ok(()),
				}
			})],
		);
		schema.validate(config)
	}
}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for file storage (default: "./data/storage")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_STORAGE_PATH);

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

/// Registry for the file storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	fn storage() -> (TempDir, FileStorage) {
		let dir = TempDir::new().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());
		(dir, storage)
	}

	#[test]
	fn test_key_encoding_round_trip() {
		let key = "orders:3f2a-b9/x y";
		let encoded = encode_key(key);
		assert!(!encoded.contains(':'));
		assert!(!encoded.contains('/'));
		assert_eq!(decode_key(&encoded).as_deref(), Some(key));
	}

	#[tokio::test]
	async fn test_basic_operations() {
		let (_dir, storage) = storage();
		storage.set_bytes("orders:1", b"{}".to_vec()).await.unwrap();
		assert_eq!(storage.get_bytes("orders:1").await.unwrap(), b"{}".to_vec());
		assert!(storage.exists("orders:1").await.unwrap());

		storage.delete("orders:1").await.unwrap();
		assert!(matches!(
			storage.get_bytes("orders:1").await,
			Err(StorageError::NotFound)
		));
		// Deleting twice is fine
		storage.delete("orders:1").await.unwrap();
	}

	#[tokio::test]
	async fn test_set_if_absent_keeps_first_value() {
		let (dir, storage) = storage();
		assert!(storage
			.set_bytes_if_absent("match_by_pair:d1:m1", b"a".to_vec())
			.await
			.unwrap());
		assert!(!storage
			.set_bytes_if_absent("match_by_pair:d1:m1", b"b".to_vec())
			.await
			.unwrap());
		assert_eq!(
			storage.get_bytes("match_by_pair:d1:m1").await.unwrap(),
			b"a".to_vec()
		);

		// No temp files are left behind
		let leftovers = std::fs::read_dir(dir.path())
			.unwrap()
			.filter_map(|e| e.ok())
			.filter(|e| e.file_name().to_string_lossy().starts_with(".tmp-"))
			.count();
		assert_eq!(leftovers, 0);
	}

	#[tokio::test]
	async fn test_scan_prefix() {
		let (_dir, storage) = storage();
		storage.set_bytes("messages:o1:02", vec![2]).await.unwrap();
		storage.set_bytes("messages:o1:01", vec![1]).await.unwrap();
		storage.set_bytes("messages:o2:01", vec![3]).await.unwrap();

		let found = storage.scan_prefix("messages:o1:").await.unwrap();
		assert_eq!(
			found,
			vec![
				("messages:o1:01".to_string(), vec![1]),
				("messages:o1:02".to_string(), vec![2]),
			]
		);
	}

	#[tokio::test]
	async fn test_scan_missing_directory_is_empty() {
		let storage = FileStorage::new(PathBuf::from("/nonexistent/atelier/storage"));
		assert!(storage.scan_prefix("orders:").await.unwrap().is_empty());
	}

	#[test]
	fn test_schema_rejects_wrong_type() {
		let config: toml::Value = toml::from_str("storage_path = 42").unwrap();
		assert!(create_storage(&config).is_err());

		let config: toml::Value = toml::from_str("storage_path = \"/tmp/x\"").unwrap();
		assert!(create_storage(&config).is_ok());
	}
}
