//! Match registry.
//!
//! One record per (design, manufacturer) pairing. Creation is create-if-absent
//! through a pair index, and the status only ever moves
//! `pending -> accepted | rejected`.

use super::order::OwnershipError;
use crate::utils::KeyedLocks;
use atelier_storage::{StorageError, StorageService};
use atelier_types::{Actor, ManufacturerMatch, MatchStatus, Role, StorageKey};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatchRegistryError {
	#[error("Storage error: {0}")]
	Storage(String),
	#[error("Match not found: {0}")]
	MatchNotFound(String),
	#[error("Invalid match transition from {from} to {to}")]
	InvalidTransition { from: MatchStatus, to: MatchStatus },
	#[error(transparent)]
	Ownership(#[from] OwnershipError),
}

/// Result of a status update.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
	pub record: ManufacturerMatch,
	/// `false` when the record already held the requested status.
	pub changed: bool,
}

pub struct MatchRegistry {
	storage: Arc<StorageService>,
	locks: KeyedLocks,
}

fn pair_key(design_id: &str, manufacturer_id: &str) -> String {
	format!("{}:{}", design_id, manufacturer_id)
}

impl MatchRegistry {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self {
			storage,
			locks: KeyedLocks::new(),
		}
	}

	/// Creates the pairing unless one already exists.
	///
	/// Returns the stored record and whether this call created it. A losing
	/// concurrent creator removes its own record and returns the winner's.
	pub async fn create_if_absent(
		&self,
		design_id: &str,
		manufacturer_id: &str,
		score: f64,
		now: DateTime<Utc>,
	) -> Result<(ManufacturerMatch, bool), MatchRegistryError> {
		let pair = pair_key(design_id, manufacturer_id);
		if let Some(existing) = self.find(design_id, manufacturer_id).await? {
			// Rewritten so a record whose index write failed still gets listed
			self.index_for_manufacturer(&existing).await?;
			return Ok((existing, false));
		}

		let record = ManufacturerMatch {
			id: uuid::Uuid::new_v4().to_string(),
			design_id: design_id.to_string(),
			manufacturer_id: manufacturer_id.to_string(),
			score,
			status: MatchStatus::Pending,
			created_at: now,
			responded_at: None,
		};
		self.storage
			.store(StorageKey::Matches.as_str(), &record.id, &record)
			.await
			.map_err(|e| MatchRegistryError::Storage(e.to_string()))?;

		let won = self
			.storage
			.store_if_absent(StorageKey::MatchByPair.as_str(), &pair, &record.id)
			.await
			.map_err(|e| MatchRegistryError::Storage(e.to_string()))?;
		if won {
			self.index_for_manufacturer(&record).await?;
			return Ok((record, true));
		}

		self.storage
			.remove(StorageKey::Matches.as_str(), &record.id)
			.await
			.map_err(|e| MatchRegistryError::Storage(e.to_string()))?;
		let existing = self
			.find(design_id, manufacturer_id)
			.await?
			.ok_or(MatchRegistryError::MatchNotFound(pair))?;
		Ok((existing, false))
	}

	async fn index_for_manufacturer(
		&self,
		record: &ManufacturerMatch,
	) -> Result<(), MatchRegistryError> {
		self.storage
			.store(
				StorageKey::MatchesByManufacturer.as_str(),
				&pair_key(&record.manufacturer_id, &record.design_id),
				&record.id,
			)
			.await
			.map_err(|e| MatchRegistryError::Storage(e.to_string()))
	}

	pub async fn get(&self, match_id: &str) -> Result<ManufacturerMatch, MatchRegistryError> {
		self.storage
			.retrieve(StorageKey::Matches.as_str(), match_id)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => MatchRegistryError::MatchNotFound(match_id.to_string()),
				other => MatchRegistryError::Storage(other.to_string()),
			})
	}

	/// The record for a pairing, if one exists.
	pub async fn find(
		&self,
		design_id: &str,
		manufacturer_id: &str,
	) -> Result<Option<ManufacturerMatch>, MatchRegistryError> {
		let id: Option<String> = self
			.storage
			.try_retrieve(
				StorageKey::MatchByPair.as_str(),
				&pair_key(design_id, manufacturer_id),
			)
			.await
			.map_err(|e| MatchRegistryError::Storage(e.to_string()))?;
		match id {
			Some(id) => self.get(&id).await.map(Some),
			None => Ok(None),
		}
	}

	/// Every match recorded for a design, in manufacturer id order.
	pub async fn list(&self, design_id: &str) -> Result<Vec<ManufacturerMatch>, MatchRegistryError> {
		let ids: Vec<String> = self
			.storage
			.retrieve_all(StorageKey::MatchByPair.as_str(), &format!("{}:", design_id))
			.await
			.map_err(|e| MatchRegistryError::Storage(e.to_string()))?;

		let mut records = Vec::with_capacity(ids.len());
		for id in ids {
			records.push(self.get(&id).await?);
		}
		Ok(records)
	}

	/// Every match request addressed to a manufacturer, newest first.
	pub async fn list_for_manufacturer(
		&self,
		manufacturer_id: &str,
	) -> Result<Vec<ManufacturerMatch>, MatchRegistryError> {
		let ids: Vec<String> = self
			.storage
			.retrieve_all(
				StorageKey::MatchesByManufacturer.as_str(),
				&format!("{}:", manufacturer_id),
			)
			.await
			.map_err(|e| MatchRegistryError::Storage(e.to_string()))?;

		let mut records = Vec::with_capacity(ids.len());
		for id in ids {
			records.push(self.get(&id).await?);
		}
		records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		Ok(records)
	}

	/// Records the manufacturer's response to a match request.
	///
	/// Only the named manufacturer may respond. Repeating the current status is
	/// a no-op; any other change out of a terminal status is refused.
	pub async fn update_status(
		&self,
		actor: &Actor,
		match_id: &str,
		status: MatchStatus,
		now: DateTime<Utc>,
	) -> Result<StatusUpdate, MatchRegistryError> {
		let _guard = self.locks.lock(match_id).await;
		let mut record = self.get(match_id).await?;

		if actor.role != Role::Manufacturer || actor.id != record.manufacturer_id {
			return Err(OwnershipError::NotMatchParty.into());
		}
		if record.status == status {
			return Ok(StatusUpdate {
				record,
				changed: false,
			});
		}
		if !Self::is_valid_transition(record.status, status) {
			return Err(MatchRegistryError::InvalidTransition {
				from: record.status,
				to: status,
			});
		}

		record.status = status;
		record.responded_at = Some(now);
		self.storage
			.update(StorageKey::Matches.as_str(), match_id, &record)
			.await
			.map_err(|e| MatchRegistryError::Storage(e.to_string()))?;

		Ok(StatusUpdate {
			record,
			changed: true,
		})
	}

	/// Checks if a status transition is valid
	fn is_valid_transition(from: MatchStatus, to: MatchStatus) -> bool {
		// Static transition table - each status maps to allowed next statuses
		static TRANSITIONS: Lazy<HashMap<MatchStatus, HashSet<MatchStatus>>> = Lazy::new(|| {
			let mut m = HashMap::new();
			m.insert(
				MatchStatus::Pending,
				HashSet::from([MatchStatus::Accepted, MatchStatus::Rejected]),
			);
			m.insert(MatchStatus::Accepted, HashSet::new()); // terminal
			m.insert(MatchStatus::Rejected, HashSet::new()); // terminal
			m
		});

		TRANSITIONS
			.get(&from)
			.is_some_and(|set| set.contains(&to))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use atelier_storage::implementations::memory::MemoryStorage;

	fn registry() -> Arc<MatchRegistry> {
		let storage = Arc::new(StorageService::new(Box::new(MemoryStorage::new())));
		Arc::new(MatchRegistry::new(storage))
	}

	#[tokio::test]
	async fn test_duplicate_creation_returns_existing() {
		let registry = registry();
		let now = Utc::now();
		let (first, created) = registry
			.create_if_absent("design-1", "mfr-a", 72.0, now)
			.await
			.unwrap();
		assert!(created);

		let (second, created) = registry
			.create_if_absent("design-1", "mfr-a", 10.0, now)
			.await
			.unwrap();
		assert!(!created);
		assert_eq!(first, second);
		assert_eq!(registry.list("design-1").await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn test_concurrent_creation_single_record() {
		let registry = registry();
		let mut handles = Vec::new();
		for i in 0..16 {
			let registry = registry.clone();
			handles.push(tokio::spawn(async move {
				registry
					.create_if_absent("design-1", "mfr-a", i as f64, Utc::now())
					.await
					.unwrap()
					.0
			}));
		}
		let mut ids = HashSet::new();
		for handle in handles {
			ids.insert(handle.await.unwrap().id);
		}
		assert_eq!(ids.len(), 1);
		assert_eq!(registry.list("design-1").await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn test_list_is_scoped_to_design() {
		let registry = registry();
		let now = Utc::now();
		registry.create_if_absent("design-1", "mfr-b", 50.0, now).await.unwrap();
		registry.create_if_absent("design-1", "mfr-a", 60.0, now).await.unwrap();
		registry.create_if_absent("design-10", "mfr-a", 70.0, now).await.unwrap();

		let listed = registry.list("design-1").await.unwrap();
		let manufacturers: Vec<_> = listed.iter().map(|m| m.manufacturer_id.as_str()).collect();
		assert_eq!(manufacturers, vec!["mfr-a", "mfr-b"]);
	}

	#[tokio::test]
	async fn test_list_for_manufacturer_spans_designs() {
		let registry = registry();
		let now = Utc::now();
		registry.create_if_absent("design-1", "mfr-a", 50.0, now).await.unwrap();
		registry
			.create_if_absent("design-2", "mfr-a", 60.0, now + chrono::Duration::seconds(1))
			.await
			.unwrap();
		registry.create_if_absent("design-2", "mfr-ab", 70.0, now).await.unwrap();
		registry.create_if_absent("design-1", "mfr-a", 10.0, now).await.unwrap();

		let listed = registry.list_for_manufacturer("mfr-a").await.unwrap();
		let designs: Vec<_> = listed.iter().map(|m| m.design_id.as_str()).collect();
		assert_eq!(designs, vec!["design-2", "design-1"]);
		assert!(listed.iter().all(|m| m.manufacturer_id == "mfr-a"));
	}

	#[tokio::test]
	async fn test_status_transitions() {
		let registry = registry();
		let now = Utc::now();
		let (record, _) = registry
			.create_if_absent("design-1", "mfr-a", 80.0, now)
			.await
			.unwrap();
		let actor = Actor::manufacturer("mfr-a");

		let update = registry
			.update_status(&actor, &record.id, MatchStatus::Accepted, now)
			.await
			.unwrap();
		assert!(update.changed);
		assert!(update.record.responded_at.is_some());

		let again = registry
			.update_status(&actor, &record.id, MatchStatus::Accepted, now)
			.await
			.unwrap();
		assert!(!again.changed);

		let err = registry
			.update_status(&actor, &record.id, MatchStatus::Rejected, now)
			.await
			.unwrap_err();
		assert!(matches!(err, MatchRegistryError::InvalidTransition { .. }));
	}

	#[tokio::test]
	async fn test_only_matched_manufacturer_responds() {
		let registry = registry();
		let now = Utc::now();
		let (record, _) = registry
			.create_if_absent("design-1", "mfr-a", 80.0, now)
			.await
			.unwrap();

		for actor in [Actor::manufacturer("mfr-b"), Actor::designer("mfr-a")] {
			let err = registry
				.update_status(&actor, &record.id, MatchStatus::Accepted, now)
				.await
				.unwrap_err();
			assert!(matches!(
				err,
				MatchRegistryError::Ownership(OwnershipError::NotMatchParty)
			));
		}
	}

	#[test]
	fn test_pending_cannot_be_restored() {
		assert!(!MatchRegistry::is_valid_transition(
			MatchStatus::Accepted,
			MatchStatus::Pending
		));
		assert!(MatchRegistry::is_valid_transition(
			MatchStatus::Pending,
			MatchStatus::Rejected
		));
	}
}
