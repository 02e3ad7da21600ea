//! Event handlers run by the engine loop.

pub mod design;

pub use design::DesignStatusHandler;
