//! State management for the shared order record and match pairings.
//!
//! Both enforce who may write what and persist through the storage service,
//! serializing read-modify-write cycles per record.

pub mod matching;
pub mod order;

pub use matching::{MatchRegistry, MatchRegistryError, StatusUpdate};
pub use order::{
	apply_patch, changed_fields, mirror_status, OrderStateError, OrderStateMachine,
	OwnershipError, PatchError, ValidationError,
};
