//! In-memory view state of one aggregator.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use lendhub_core::types::id::{NotificationId, SourceId};
use lendhub_core::types::pagination::{PageWindow, page};
use lendhub_entity::notification::{Notification, NotificationCategory};
use lendhub_entity::read_state::ReadState;
use lendhub_entity::source::{FeedSnapshot, SourceType};

use crate::metrics::EngineMetrics;
use crate::notification::arrival::{Arrival, ArrivalDetector};
use crate::notification::filter::{FilterSpec, NotificationTab, filter};
use crate::notification::merge::merge;
use crate::notification::transformer::{TransformContext, TransformOutcome, transform};

/// Delivery status of one feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FeedStatus {
    /// No snapshot or failure yet.
    Pending,
    /// Last delivery was a snapshot.
    Live,
    /// Last delivery was a failure; contributes nothing to the view.
    Failed,
}

#[derive(Debug)]
struct FeedState {
    status: FeedStatus,
    notifications: Vec<Notification>,
    /// First observation time of every record currently in the feed.
    first_seen: HashMap<SourceId, DateTime<Utc>>,
}

impl FeedState {
    fn new() -> Self {
        Self {
            status: FeedStatus::Pending,
            notifications: Vec::new(),
            first_seen: HashMap::new(),
        }
    }
}

/// Total and unread count of one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    /// Notifications in the category.
    pub total: usize,
    /// Unread notifications in the category.
    pub unread: usize,
}

/// Badge counts over the merged (unfiltered) notification set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationCounts {
    /// All notifications.
    pub total: usize,
    /// Unread notifications.
    pub unread: usize,
    /// Action items.
    pub action_items: usize,
    /// Personal notifications.
    pub personal: usize,
    /// Unread action items.
    pub unread_action_items: usize,
    /// Unread personal notifications.
    pub unread_personal: usize,
    /// Per-category totals.
    pub per_category: BTreeMap<NotificationCategory, CategoryCount>,
}

/// Feeds, read states, and the derived merged/filtered lists.
///
/// Every mutation recomputes the derived lists before returning, so readers
/// never observe a merged list that disagrees with the feeds.
#[derive(Debug)]
pub(crate) struct AggregatorState {
    feeds: BTreeMap<SourceType, FeedState>,
    read_states: HashMap<NotificationId, ReadState>,
    detector: ArrivalDetector,
    merged: Vec<Notification>,
    filtered: Vec<Notification>,
    filter: FilterSpec,
    window: PageWindow,
    closed: bool,
}

impl AggregatorState {
    pub(crate) fn new(
        sources: &[SourceType],
        read_states: HashMap<NotificationId, ReadState>,
        page_size: usize,
    ) -> Self {
        Self {
            feeds: sources.iter().map(|s| (*s, FeedState::new())).collect(),
            read_states,
            detector: ArrivalDetector::new(),
            merged: Vec::new(),
            filtered: Vec::new(),
            filter: FilterSpec::default(),
            window: PageWindow::new(page_size),
            closed: false,
        }
    }

    /// Replace a feed's contents with a new snapshot and return its arrivals.
    pub(crate) fn apply_snapshot(
        &mut self,
        source_type: SourceType,
        snapshot: &FeedSnapshot,
        metrics: &EngineMetrics,
    ) -> Vec<Arrival> {
        let feed = self.feeds.entry(source_type).or_insert_with(FeedState::new);

        let mut first_seen = HashMap::with_capacity(snapshot.len());
        let mut notifications = Vec::with_capacity(snapshot.len());
        for record in &snapshot.records {
            let observed_at = feed
                .first_seen
                .get(&record.id)
                .copied()
                .unwrap_or(snapshot.received_at);
            first_seen.insert(record.id.clone(), observed_at);

            let ctx = TransformContext {
                observed_at,
                snapshot_at: snapshot.received_at,
            };
            match transform(record, source_type, ctx) {
                TransformOutcome::Built(notification) => notifications.push(*notification),
                TransformOutcome::Suppressed(_) => {
                    EngineMetrics::inc(&metrics.records_suppressed);
                }
                TransformOutcome::Skipped(reason) => {
                    warn!(source_type = %source_type, reason, "Skipping feed record");
                    EngineMetrics::inc(&metrics.records_skipped);
                }
            }
        }

        feed.status = FeedStatus::Live;
        feed.first_seen = first_seen;
        let arrivals = self.detector.observe(source_type, &notifications);
        feed.notifications = notifications;

        EngineMetrics::inc(&metrics.snapshots_applied);
        self.recompute();
        arrivals
    }

    /// Treat a feed as empty after a failure. Its arrival baseline is kept.
    pub(crate) fn apply_failure(&mut self, source_type: SourceType) {
        let feed = self.feeds.entry(source_type).or_insert_with(FeedState::new);
        feed.status = FeedStatus::Failed;
        feed.notifications.clear();
        self.recompute();
    }

    /// A feed stream ended. A feed that never delivered stops holding up loading.
    pub(crate) fn apply_closed(&mut self, source_type: SourceType) {
        if let Some(feed) = self.feeds.get_mut(&source_type)
            && feed.status == FeedStatus::Pending
        {
            feed.status = FeedStatus::Failed;
        }
    }

    fn recompute(&mut self) {
        self.merged = merge(
            self.feeds.values().map(|f| f.notifications.as_slice()),
            &self.read_states,
        );
        self.filtered = filter(&self.merged, &self.filter);
    }

    /// True until every feed has delivered a snapshot or failed.
    pub(crate) fn is_loading(&self) -> bool {
        self.feeds.values().any(|f| f.status == FeedStatus::Pending)
    }

    #[cfg(test)]
    pub(crate) fn feed_status(&self, source_type: SourceType) -> Option<FeedStatus> {
        self.feeds.get(&source_type).map(|f| f.status)
    }

    pub(crate) fn visible(&self) -> Vec<Notification> {
        page(&self.filtered, 0, self.window.limit())
    }

    pub(crate) fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    pub(crate) fn has_more(&self) -> bool {
        self.window.has_more(self.filtered.len())
    }

    pub(crate) fn load_more(&mut self) -> bool {
        if !self.has_more() {
            return false;
        }
        self.window.load_more();
        true
    }

    pub(crate) fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    /// Replace the filter and collapse the window to the first page.
    pub(crate) fn set_filter(&mut self, spec: FilterSpec) {
        self.filter = spec;
        self.window.reset();
        self.filtered = filter(&self.merged, &self.filter);
    }

    #[cfg(test)]
    pub(crate) fn window(&self) -> PageWindow {
        self.window
    }

    pub(crate) fn find(&self, id: NotificationId) -> Option<&Notification> {
        self.merged.iter().find(|n| n.id == id)
    }

    /// Mark one notification read. `None` if it was already read.
    pub(crate) fn mark_read(&mut self, id: NotificationId, at: DateTime<Utc>) -> Option<ReadState> {
        let current = self.read_states.get(&id).copied().unwrap_or_default();
        if current.is_read {
            return None;
        }
        let state = current.mark_read(at);
        self.read_states.insert(id, state);
        self.recompute();
        Some(state)
    }

    /// Mark every unread notification of `tab`, narrowed by the active
    /// filter's other predicates, as read.
    pub(crate) fn mark_all_read(
        &mut self,
        tab: NotificationTab,
        at: DateTime<Utc>,
    ) -> Vec<(NotificationId, ReadState)> {
        let scope = self.filter.with_tab(tab);
        let marked: Vec<(NotificationId, ReadState)> = self
            .merged
            .iter()
            .filter(|n| n.is_unread() && scope.matches(n))
            .map(|n| (n.id, ReadState::default().mark_read(at)))
            .collect();
        if marked.is_empty() {
            return marked;
        }
        self.read_states.extend(marked.iter().copied());
        self.recompute();
        marked
    }

    /// Overlay a read state produced elsewhere (quick actions).
    /// Record a read state. A notification already read keeps its first `read_at`.
    pub(crate) fn set_read_state(&mut self, id: NotificationId, state: ReadState) {
        let state = match self.read_states.get(&id) {
            Some(existing) if existing.is_read => *existing,
            _ => state,
        };
        self.read_states.insert(id, state);
        self.recompute();
    }

    pub(crate) fn counts(&self) -> NotificationCounts {
        let mut counts = NotificationCounts::default();
        for n in &self.merged {
            counts.total += 1;
            let entry = counts.per_category.entry(n.category).or_default();
            entry.total += 1;
            if n.is_action_item() {
                counts.action_items += 1;
            } else {
                counts.personal += 1;
            }
            if n.is_unread() {
                counts.unread += 1;
                entry.unread += 1;
                if n.is_action_item() {
                    counts.unread_action_items += 1;
                } else {
                    counts.unread_personal += 1;
                }
            }
        }
        counts
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn close(&mut self) {
        self.closed = true;
    }
}
