//! Shared types: identifiers and pagination.

pub mod id;
pub mod pagination;

pub use id::{AdminId, HistoryEntryId, NotificationId, SourceId};
pub use pagination::PageWindow;
