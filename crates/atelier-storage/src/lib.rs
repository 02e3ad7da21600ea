//! Storage module for the Atelier workflow.
//!
//! This module provides a key-value abstraction over persistent storage of
//! designs, orders, matches and messages, with in-memory and file-based
//! backends selected by name from configuration.

use async_trait::async_trait;
use atelier_types::{ConfigSchema, ImplementationRegistry};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub mod implementations {
	pub mod file;
	pub mod memory;
}

#[derive(Debug, Error)]
pub enum StorageError {
	/// No value under the requested key.
	#[error("Not found")]
	NotFound,
	/// A stored record could not be encoded or decoded as JSON.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// The backend itself failed (disk, permissions, ...).
	#[error("Backend error: {0}")]
	Backend(String),
	/// The backend's TOML section is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Byte-level key-value backend.
///
/// Every write must be all-or-nothing: a reader sees either the previous
/// value or the complete new one.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Reads the value under `key`, or `NotFound`.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes, replacing any previous value.
	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Stores raw bytes only if the key is absent.
	///
	/// Returns `true` when the value was written and `false` when the key
	/// already existed, in which case nothing changes.
	async fn set_bytes_if_absent(&self, key: &str, value: Vec<u8>) -> Result<bool, StorageError>;

	/// Removes `key`. Removing an absent key is not an error.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	async fn exists(&self, key: &str) -> Result<bool, StorageError>;

	/// Returns every `(key, value)` whose key starts with `prefix`, sorted by key.
	async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StorageError>;

	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Builds a backend from its `[storage.implementations.<name>]` table.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// Every backend that can be named as `storage.primary`.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// Typed JSON records over a [`StorageInterface`], keyed `namespace:id`.
pub struct StorageService {
	backend: Box<dyn StorageInterface>,
}

fn make_key(namespace: &str, id: &str) -> String {
	format!("{}:{}", namespace, id)
}

fn encode<T: Serialize>(data: &T) -> Result<Vec<u8>, StorageError> {
	serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageError> {
	serde_json::from_slice(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
}

impl StorageService {
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	/// Writes `data`, replacing whatever was stored under the id.
	pub async fn store<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		self.backend
			.set_bytes(&make_key(namespace, id), encode(data)?)
			.await
	}

	/// Stores a value only if nothing is stored under the key yet.
	///
	/// Returns `true` if this call created the entry.
	pub async fn store_if_absent<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<bool, StorageError> {
		self.backend
			.set_bytes_if_absent(&make_key(namespace, id), encode(data)?)
			.await
	}

	/// Reads the record under `namespace:id`; `NotFound` if there is none.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(&make_key(namespace, id)).await?;
		decode(&bytes)
	}

	/// Like [`retrieve`](Self::retrieve) with absence as `None`.
	pub async fn try_retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<Option<T>, StorageError> {
		match self.retrieve(namespace, id).await {
			Ok(value) => Ok(Some(value)),
			Err(StorageError::NotFound) => Ok(None),
			Err(e) => Err(e),
		}
	}

	/// Retrieves every value in a namespace whose id starts with `id_prefix`,
	/// in key order.
	pub async fn retrieve_all<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id_prefix: &str,
	) -> Result<Vec<T>, StorageError> {
		self.backend
			.scan_prefix(&make_key(namespace, id_prefix))
			.await?
			.iter()
			.map(|(_, bytes)| decode(bytes))
			.collect()
	}

	pub async fn remove(&self, namespace: &str, id: &str) -> Result<(), StorageError> {
		self.backend.delete(&make_key(namespace, id)).await
	}

	/// Overwrites an existing record; `NotFound` if nothing is stored yet.
	pub async fn update<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let key = make_key(namespace, id);
		if !self.backend.exists(&key).await? {
			return Err(StorageError::NotFound);
		}
		self.backend.set_bytes(&key, encode(data)?).await
	}

	pub async fn exists(&self, namespace: &str, id: &str) -> Result<bool, StorageError> {
		self.backend.exists(&make_key(namespace, id)).await
	}
}
