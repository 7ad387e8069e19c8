//! Detection of genuinely new items across successive feed snapshots.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use lendhub_core::types::id::NotificationId;
use lendhub_entity::notification::{Notification, NotificationPriority};
use lendhub_entity::source::SourceType;

/// Lightweight summary handed to arrival callbacks (toast alerts).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrivalSummary {
    /// Notification title.
    pub title: String,
    /// One-line message.
    pub message: String,
    /// Priority of the new item.
    pub priority: NotificationPriority,
    /// Deep link to the item.
    pub link: String,
}

impl ArrivalSummary {
    /// Summarize a notification.
    pub fn of(notification: &Notification) -> Self {
        Self {
            title: notification.title.clone(),
            message: notification.description.clone(),
            priority: notification.priority,
            link: notification.link.clone(),
        }
    }
}

/// A new item that appeared in a feed since its previous snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arrival {
    /// Feed the item appeared in.
    pub source_type: SourceType,
    /// Id of the new notification.
    pub notification_id: NotificationId,
    /// Summary for alerting.
    pub summary: ArrivalSummary,
}

/// Per-feed baseline of the ids present in the previous snapshot.
///
/// The first snapshot of a feed only records the baseline; later
/// snapshots emit one arrival per id absent from the previous set, so a
/// snapshot that swaps one item for another (same size) still reports the
/// newcomer.
#[derive(Debug, Default)]
pub struct ArrivalDetector {
    baselines: HashMap<SourceType, HashSet<NotificationId>>,
}

impl ArrivalDetector {
    /// Create a detector with no baselines.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the notifications of a new snapshot of `source_type`.
    ///
    /// Returns arrivals in snapshot order. Ids repeated within one
    /// snapshot are reported once.
    pub fn observe(
        &mut self,
        source_type: SourceType,
        notifications: &[Notification],
    ) -> Vec<Arrival> {
        let current: HashSet<NotificationId> = notifications.iter().map(|n| n.id).collect();

        let Some(previous) = self.baselines.get(&source_type) else {
            self.baselines.insert(source_type, current);
            return Vec::new();
        };

        let mut reported = HashSet::new();
        let arrivals = notifications
            .iter()
            .filter(|n| !previous.contains(&n.id) && reported.insert(n.id))
            .map(|n| Arrival {
                source_type,
                notification_id: n.id,
                summary: ArrivalSummary::of(n),
            })
            .collect();

        self.baselines.insert(source_type, current);
        arrivals
    }
}
