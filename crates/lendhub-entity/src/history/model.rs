//! History entry entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lendhub_core::types::id::{AdminId, HistoryEntryId, NotificationId, SourceId};

use crate::notification::ActionKind;
use crate::source::SourceType;

/// An immutable record of an administrative action on a source record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique entry identifier.
    pub id: HistoryEntryId,
    /// The administrator who acted.
    pub actor_id: AdminId,
    /// The action that was performed.
    pub action: ActionKind,
    /// Collection of the target record.
    pub target_type: SourceType,
    /// The target record.
    pub target_id: SourceId,
    /// Notification the action was taken from.
    pub notification_id: NotificationId,
    /// Reason given by the administrator, if any.
    pub reason: Option<String>,
    /// When the action took effect.
    pub created_at: DateTime<Utc>,
}
