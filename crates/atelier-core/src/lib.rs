//! Core workflow engine for the Atelier order system.
//!
//! This crate owns the shared order record and everything that reads or writes
//! it: stage resolution for both roles, the approval gates that block the stage
//! cursor, the manufacturer match registry, the order store with its
//! role-scoped writes, change notification and the engine that mirrors order
//! progress back onto the design.

pub mod builder;
pub mod engine;
pub mod handlers;
pub mod notifier;
pub mod scoring;
pub mod state;
pub mod store;
pub mod utils;
pub mod workflow;

pub use builder::{AtelierBuilder, AtelierFactories, BuilderError};
pub use engine::{event_bus::EventBus, AtelierEngine, EngineError};
pub use notifier::{
	MessageNotification, MessageSubscription, OrderNotification, OrderSubscription, OrderWatcher,
};
pub use scoring::{ManufacturerScorer, WeightedScorer};
pub use store::{OrderStore, StoreError};
pub use workflow::{WorkflowCursor, WorkflowSession, WorkflowSnapshot};
