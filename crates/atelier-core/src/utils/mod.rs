//! Utility helpers for the atelier core.
//!
//! Contains the per-key async lock table used to serialize read-modify-write
//! cycles on a single record.

pub mod locks;

pub use locks::KeyedLocks;
