//! Per-key async mutexes.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A table of async mutexes keyed by record id.
///
/// Writers to the same key queue behind each other; writers to different keys
/// never contend. Entries are created on first use and kept for the life of
/// the table.
#[derive(Default)]
pub struct KeyedLocks {
	locks: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyedLocks {
	pub fn new() -> Self {
		Self::default()
	}

	/// Waits for exclusive access to `key`.
	pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
		// Clone the Arc out so the DashMap shard guard is released before awaiting
		let mutex = self
			.locks
			.entry(key.to_string())
			.or_insert_with(|| Arc::new(Mutex::new(())))
			.clone();
		mutex.lock_owned().await
	}

	pub fn len(&self) -> usize {
		self.locks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.locks.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::time::Duration;

	#[tokio::test]
	async fn test_same_key_is_serialized() {
		let locks = Arc::new(KeyedLocks::new());
		let inside = Arc::new(AtomicUsize::new(0));
		let mut handles = Vec::new();

		for _ in 0..8 {
			let locks = locks.clone();
			let inside = inside.clone();
			handles.push(tokio::spawn(async move {
				let _guard = locks.lock("order-1").await;
				assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
				tokio::time::sleep(Duration::from_millis(2)).await;
				inside.fetch_sub(1, Ordering::SeqCst);
			}));
		}
		for handle in handles {
			handle.await.unwrap();
		}
		assert_eq!(locks.len(), 1);
	}

	#[tokio::test]
	async fn test_different_keys_do_not_block() {
		let locks = KeyedLocks::new();
		let _a = locks.lock("order-a").await;
		let b = tokio::time::timeout(Duration::from_millis(100), locks.lock("order-b")).await;
		assert!(b.is_ok());
	}
}
