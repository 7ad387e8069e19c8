//! Canonical notification model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lendhub_core::types::id::{NotificationId, SourceId};

use crate::read_state::ReadState;
use crate::source::SourceType;

use super::category::NotificationCategory;
use super::priority::NotificationPriority;
use super::quick_action::{ActionKind, QuickAction};
use super::subject::NotificationSubject;

/// A notification materialized from one source record.
///
/// Everything except `is_read`/`read_at` is fixed when the notification is
/// built from a snapshot; the read fields are overlaid at query time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Deterministic id derived from `(source_type, source_id)`.
    pub id: NotificationId,
    /// Feed the record came from.
    pub source_type: SourceType,
    /// Record id within its feed.
    pub source_id: SourceId,
    /// Category derived from the source type.
    pub category: NotificationCategory,
    /// Priority derived from the source type or a record override.
    pub priority: NotificationPriority,
    /// Rendered title.
    pub title: String,
    /// Rendered one-line description.
    pub description: String,
    /// Rendered detail text.
    pub detail: String,
    /// Deep-link target.
    pub link: String,
    /// Record creation time, or first observation time when absent.
    pub created_at: DateTime<Utc>,
    /// Source-specific fields.
    pub subject: NotificationSubject,
    /// Offered quick actions, in display order.
    pub quick_actions: Vec<QuickAction>,
    /// Whether the administrator has read this notification.
    pub is_read: bool,
    /// When it was read.
    pub read_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Check if the notification has been read.
    pub fn is_unread(&self) -> bool {
        !self.is_read
    }

    /// Whether the notification asks for an administrative decision.
    pub fn is_action_item(&self) -> bool {
        self.source_type.is_action_item()
    }

    /// Whether `kind` is one of the offered quick actions.
    pub fn offers(&self, kind: ActionKind) -> bool {
        self.quick_actions.iter().any(|action| action.kind == kind)
    }

    /// Overlay a stored read state.
    pub fn apply_read_state(&mut self, state: &ReadState) {
        self.is_read = state.is_read;
        self.read_at = state.read_at;
    }
}
