//! Source feed configuration.

use serde::{Deserialize, Serialize};

/// Which source feeds an aggregator subscribes to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Source type names to subscribe to (`"user_registration"`, `"loan_request"`, ...).
    #[serde(default = "default_enabled_sources")]
    pub enabled_sources: Vec<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            enabled_sources: default_enabled_sources(),
        }
    }
}

fn default_enabled_sources() -> Vec<String> {
    vec![
        "user_registration".to_string(),
        "loan_request".to_string(),
        "overdue_loan".to_string(),
        "reservation_request".to_string(),
        "personal".to_string(),
    ]
}
