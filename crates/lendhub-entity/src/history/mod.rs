//! Immutable history of administrative actions.

pub mod model;

pub use model::HistoryEntry;
