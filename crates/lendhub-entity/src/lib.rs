//! # lendhub-entity
//!
//! Domain types shared by the notification engine and its collaborators:
//! raw source records and snapshots, the canonical [`Notification`],
//! per-administrator [`ReadState`], and immutable [`HistoryEntry`] values.

pub mod history;
pub mod notification;
pub mod read_state;
pub mod source;

pub use history::HistoryEntry;
pub use notification::{
    ActionKind, ActionVariant, Notification, NotificationCategory, NotificationPriority,
    NotificationSubject, PersonalKind, QuickAction,
};
pub use read_state::ReadState;
pub use source::{FeedPredicate, FeedSnapshot, RawRecord, SourceType};
