//! Core engine that owns the store and reacts to workflow events.
//!
//! The store publishes every accepted write on the event bus. The engine's
//! run loop consumes those events to keep derived, display-only state in sync,
//! such as the status mirror on each design.

pub mod event_bus;
pub mod lifecycle;

use crate::handlers::DesignStatusHandler;
use crate::store::OrderStore;
use atelier_config::Config;
use atelier_storage::StorageService;
use atelier_types::{OrderEvent, WorkflowEvent};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast::error::RecvError, Semaphore};

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Service error: {0}")]
	Service(String),
	#[error("Handler error: {0}")]
	Handler(String),
}

/// Upper bound on concurrently running event handlers.
const MAX_CONCURRENT_HANDLERS: usize = 100;

/// Main engine tying configuration, storage, the event bus and the store together.
#[derive(Clone)]
pub struct AtelierEngine {
	pub(crate) config: Config,
	pub(crate) storage: Arc<StorageService>,
	pub(crate) event_bus: event_bus::EventBus,
	pub(crate) store: Arc<OrderStore>,
	pub(crate) status_handler: Arc<DesignStatusHandler>,
}

impl AtelierEngine {
	pub fn new(
		config: Config,
		storage: Arc<StorageService>,
		event_bus: event_bus::EventBus,
		store: Arc<OrderStore>,
	) -> Self {
		let status_handler = Arc::new(DesignStatusHandler::new(store.clone()));
		Self {
			config,
			storage,
			event_bus,
			store,
			status_handler,
		}
	}

	/// Main event loop; returns on ctrl-c.
	pub async fn run(&self) -> Result<(), EngineError> {
		self.run_until(async {
			if let Err(e) = tokio::signal::ctrl_c().await {
				tracing::error!("Failed to listen for shutdown signal: {}", e);
			}
		})
		.await
	}

	/// Main event loop; returns when `shutdown` completes.
	pub async fn run_until<S>(&self, shutdown: S) -> Result<(), EngineError>
	where
		S: Future<Output = ()>,
	{
		let mut event_receiver = self.event_bus.subscribe();
		let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_HANDLERS));
		tokio::pin!(shutdown);

		loop {
			tokio::select! {
				received = event_receiver.recv() => {
					match received {
						Ok(WorkflowEvent::Order(OrderEvent::Created { order }))
						| Ok(WorkflowEvent::Order(OrderEvent::Changed { order, .. })) => {
							self.spawn_handler(&semaphore, move |engine| async move {
								engine
									.status_handler
									.handle(&order)
									.await
									.map_err(|e| EngineError::Handler(format!("Failed to mirror design status: {}", e)))
							})
							.await;
						}
						Ok(_) => {}
						Err(RecvError::Lagged(skipped)) => {
							tracing::warn!(skipped, "Engine event loop lagged");
						}
						Err(RecvError::Closed) => break,
					}
				}

				_ = &mut shutdown => {
					break;
				}
			}
		}

		Ok(())
	}

	pub fn event_bus(&self) -> &event_bus::EventBus {
		&self.event_bus
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn storage(&self) -> &Arc<StorageService> {
		&self.storage
	}

	pub fn store(&self) -> &Arc<OrderStore> {
		&self.store
	}

	/// Spawns a handler task, bounded by the semaphore.
	async fn spawn_handler<F, Fut>(&self, semaphore: &Arc<Semaphore>, handler: F)
	where
		F: FnOnce(AtelierEngine) -> Fut + Send + 'static,
		Fut: Future<Output = Result<(), EngineError>> + Send,
	{
		let engine = self.clone();
		match semaphore.clone().acquire_owned().await {
			Ok(permit) => {
				tokio::spawn(async move {
					let _permit = permit;
					if let Err(e) = handler(engine).await {
						tracing::error!("Handler error: {}", e);
					}
				});
			},
			Err(e) => {
				tracing::error!("Failed to acquire semaphore permit: {}", e);
			},
		}
	}
}
