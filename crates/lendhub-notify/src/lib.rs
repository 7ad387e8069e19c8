//! # lendhub-notify
//!
//! Unified notification aggregation engine for LendHub administrators.
//! Provides:
//!
//! - Normalization of raw feed records into canonical notifications
//! - Arrival detection with startup-burst suppression
//! - Deterministic merge, de-duplication, and priority/recency ordering
//! - Tab/category/priority/search/date filtering with a growing page window
//! - Quick actions that mutate the source record, append history, and mark read
//! - A per-administrator facade wiring live feed subscriptions together
//! - In-memory collaborator implementations for single-node use and tests

pub mod aggregator;
pub mod error;
pub mod executor;
pub mod memory;
pub mod metrics;
pub mod notification;
pub mod traits;

pub use aggregator::{AggregatorDeps, NotificationAggregator, NotificationCounts};
pub use error::QuickActionError;
pub use executor::{QuickActionExecutor, QuickActionOutcome};
pub use metrics::EngineMetrics;
pub use notification::arrival::{ArrivalDetector, ArrivalSummary};
pub use notification::filter::{DateRange, FilterSpec, NotificationTab};
