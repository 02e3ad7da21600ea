//! Builder for constructing the atelier engine.
//!
//! Storage backends are pluggable: the builder receives factory functions by
//! name and instantiates every backend listed in the configuration, then wires
//! the primary one into the store.

use crate::engine::{event_bus::EventBus, AtelierEngine};
use crate::scoring::{ManufacturerScorer, WeightedScorer};
use crate::store::OrderStore;
use atelier_config::Config;
use atelier_storage::{StorageError, StorageInterface, StorageService};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions for every pluggable component, keyed by implementation name.
pub struct AtelierFactories<SF> {
	pub storage_factories: HashMap<String, SF>,
}

/// Builder for constructing an [`AtelierEngine`].
pub struct AtelierBuilder {
	config: Config,
}

impl AtelierBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	pub fn build<SF>(self, factories: AtelierFactories<SF>) -> Result<AtelierEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
	{
		let mut storage_impls = HashMap::new();
		for (name, config) in &self.config.storage.implementations {
			if let Some(factory) = factories.storage_factories.get(name) {
				match factory(config) {
					Ok(implementation) => {
						storage_impls.insert(name.clone(), implementation);
						let is_primary = &self.config.storage.primary == name;
						tracing::info!(component = "storage", implementation = %name, enabled = %is_primary, "Loaded");
					},
					Err(e) => {
						tracing::error!(
							component = "storage",
							implementation = %name,
							error = %e,
							"Failed to create storage implementation"
						);
						return Err(BuilderError::Config(format!(
							"Failed to create storage implementation '{}': {}",
							name, e
						)));
					},
				}
			} else {
				tracing::warn!(component = "storage", implementation = %name, "Unknown implementation, skipped");
			}
		}

		if storage_impls.is_empty() {
			return Err(BuilderError::Config(
				"No valid storage implementations available".into(),
			));
		}

		let primary_storage = &self.config.storage.primary;
		let storage_backend = storage_impls.remove(primary_storage).ok_or_else(|| {
			BuilderError::MissingComponent(format!(
				"Primary storage '{}' failed to load or has invalid configuration",
				primary_storage
			))
		})?;
		let storage = Arc::new(StorageService::new(storage_backend));

		let event_bus = EventBus::new(self.config.notifier.channel_capacity);
		let scorer: Arc<dyn ManufacturerScorer> =
			Arc::new(WeightedScorer::new(self.config.matching.strict_filters));
		tracing::info!(
			component = "matching",
			strict = %self.config.matching.strict_filters,
			max_requests = %self.config.matching.max_requests,
			"Loaded"
		);

		let store = Arc::new(OrderStore::new(
			storage.clone(),
			event_bus.clone(),
			scorer,
			self.config.matching.max_requests,
		));

		Ok(AtelierEngine::new(self.config, storage, event_bus, store))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use atelier_storage::get_all_implementations;

	fn factories() -> AtelierFactories<atelier_storage::StorageFactory> {
		AtelierFactories {
			storage_factories: get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
		}
	}

	#[test]
	fn test_builds_with_memory_primary() {
		let config: Config = r#"
[service]
id = "atelier-test"

[storage]
primary = "memory"
[storage.implementations.memory]
"#
		.parse()
		.unwrap();

		let engine = AtelierBuilder::new(config).build(factories()).unwrap();
		assert_eq!(engine.config().service.id, "atelier-test");
	}

	#[test]
	fn test_invalid_backend_config_fails() {
		let config: Config = r#"
[service]
id = "atelier-test"

[storage]
primary = "file"
[storage.implementations.file]
storage_path = ""
"#
		.parse()
		.unwrap();

		let result = AtelierBuilder::new(config).build(factories());
		assert!(matches!(result, Err(BuilderError::Config(_))));
	}
}
