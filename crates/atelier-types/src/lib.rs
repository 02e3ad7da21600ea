//! Common types module for the Atelier order workflow.
//!
//! This module defines the data model shared by every Atelier crate: the
//! two actor roles, designs and manufacturer profiles, match records, the
//! shared order record with its tri-state approvals, stage identifiers,
//! messages and the events fanned out when any of them change.

/// API types for HTTP endpoints and request/response structures.
pub mod api;
/// Tri-state approval gates and designer verdicts.
pub mod approval;
/// Approval checklists.
pub mod checklist;
/// Designs, manufacturer profiles and matching requirements.
pub mod design;
/// Event types for change notification.
pub mod events;
/// Manufacturer match records and their status machine states.
pub mod matching;
/// Order messages.
pub mod message;
/// The shared order record and role-scoped partial updates.
pub mod order;
/// Registry trait for pluggable backend implementations.
pub mod registry;
/// Actor roles.
pub mod role;
/// Schema checks for backend configuration tables.
pub mod schema;
/// Stage identifiers and resolution results.
pub mod stage;
/// Storage types for managing persistent data.
pub mod storage;
/// Utility functions for display formatting.
pub mod utils;

// Re-export all types for convenient access
pub use api::*;
pub use approval::*;
pub use checklist::*;
pub use design::*;
pub use events::*;
pub use matching::*;
pub use message::*;
pub use order::*;
pub use registry::*;
pub use role::*;
pub use schema::*;
pub use stage::*;
pub use storage::*;
pub use utils::truncate_id;
