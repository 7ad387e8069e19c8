//! Notification aggregation engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::pagination::DEFAULT_PAGE_SIZE;

/// Settings for the per-administrator aggregation facade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Number of notifications revealed per `load_more`.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Attempts for each quick-action follow-up step (history, read state).
    #[serde(default = "default_follow_up_attempts")]
    pub follow_up_attempts: u32,
    /// Base backoff between follow-up attempts, multiplied by the attempt number.
    #[serde(default = "default_follow_up_backoff")]
    pub follow_up_backoff_ms: u64,
    /// Whether arrival callbacks are invoked at all.
    #[serde(default = "default_true")]
    pub arrival_callback_enabled: bool,
}

impl NotificationConfig {
    /// Backoff before retry number `attempt` (1-based).
    pub fn follow_up_backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.follow_up_backoff_ms.saturating_mul(u64::from(attempt)))
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            follow_up_attempts: default_follow_up_attempts(),
            follow_up_backoff_ms: default_follow_up_backoff(),
            arrival_callback_enabled: true,
        }
    }
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_follow_up_attempts() -> u32 {
    3
}

fn default_follow_up_backoff() -> u64 {
    200
}

fn default_true() -> bool {
    true
}
