//! Read-state entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether an administrator has read a notification, and when.
///
/// Keyed externally by `(admin_id, notification_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReadState {
    /// Whether the notification was read.
    pub is_read: bool,
    /// When it was first marked read.
    pub read_at: Option<DateTime<Utc>>,
}

impl ReadState {
    /// A read state marked at `at`.
    pub fn read_at(at: DateTime<Utc>) -> Self {
        Self {
            is_read: true,
            read_at: Some(at),
        }
    }

    /// Merge a new "read" mark into this state.
    ///
    /// Marking an already-read state keeps the original timestamp, so
    /// repeated marks converge on the same value whatever their order.
    pub fn mark_read(self, at: DateTime<Utc>) -> Self {
        if self.is_read {
            self
        } else {
            Self::read_at(at)
        }
    }
}
