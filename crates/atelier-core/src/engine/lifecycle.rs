//! Startup and shutdown of the engine.

use super::{AtelierEngine, EngineError};
use atelier_types::StorageKey;

impl AtelierEngine {
	/// Checks the primary storage is reachable before serving.
	pub async fn initialize(&self) -> Result<(), EngineError> {
		tracing::info!(service_id = %self.config.service.id, "Initializing atelier engine");
		self.storage
			.exists(StorageKey::Designs.as_str(), "__readiness__")
			.await
			.map_err(|e| EngineError::Service(format!("Storage unreachable: {}", e)))?;
		Ok(())
	}

	pub async fn shutdown(&self) -> Result<(), EngineError> {
		tracing::info!(
			subscribers = self.event_bus.receiver_count(),
			"Shutting down atelier engine"
		);
		Ok(())
	}
}
