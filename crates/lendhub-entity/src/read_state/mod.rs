//! Per-administrator read state of notifications.

pub mod model;

pub use model::ReadState;
