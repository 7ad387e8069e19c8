//! Engine metrics counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Aggregation engine counters.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Snapshots applied to the merged view
    pub snapshots_applied: AtomicU64,
    /// Feed subscription or delivery failures
    pub feed_errors: AtomicU64,
    /// Records skipped by the transformer
    pub records_skipped: AtomicU64,
    /// Personal messages suppressed as duplicates of action items
    pub records_suppressed: AtomicU64,
    /// Arrival events emitted
    pub arrivals_emitted: AtomicU64,
    /// Read-state writes that failed
    pub read_state_write_failures: AtomicU64,
    /// Quick actions fully completed
    pub quick_actions_succeeded: AtomicU64,
    /// Quick actions whose source mutation succeeded but a follow-up failed
    pub quick_actions_partial: AtomicU64,
    /// Quick actions that did not take effect
    pub quick_actions_failed: AtomicU64,
}

impl EngineMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment a counter by one.
    pub fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            snapshots_applied: self.snapshots_applied.load(Ordering::Relaxed),
            feed_errors: self.feed_errors.load(Ordering::Relaxed),
            records_skipped: self.records_skipped.load(Ordering::Relaxed),
            records_suppressed: self.records_suppressed.load(Ordering::Relaxed),
            arrivals_emitted: self.arrivals_emitted.load(Ordering::Relaxed),
            read_state_write_failures: self.read_state_write_failures.load(Ordering::Relaxed),
            quick_actions_succeeded: self.quick_actions_succeeded.load(Ordering::Relaxed),
            quick_actions_partial: self.quick_actions_partial.load(Ordering::Relaxed),
            quick_actions_failed: self.quick_actions_failed.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Snapshots applied to the merged view
    pub snapshots_applied: u64,
    /// Feed subscription or delivery failures
    pub feed_errors: u64,
    /// Records skipped by the transformer
    pub records_skipped: u64,
    /// Personal messages suppressed as duplicates of action items
    pub records_suppressed: u64,
    /// Arrival events emitted
    pub arrivals_emitted: u64,
    /// Read-state writes that failed
    pub read_state_write_failures: u64,
    /// Quick actions fully completed
    pub quick_actions_succeeded: u64,
    /// Quick actions whose source mutation succeeded but a follow-up failed
    pub quick_actions_partial: u64,
    /// Quick actions that did not take effect
    pub quick_actions_failed: u64,
}
