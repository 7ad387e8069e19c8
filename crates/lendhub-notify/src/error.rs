//! Quick-action error types.

use thiserror::Error;

use lendhub_core::error::AppError;
use lendhub_entity::notification::ActionKind;
use lendhub_entity::source::SourceType;

/// Why a quick action (or one of its steps) failed.
#[derive(Debug, Clone, Error)]
pub enum QuickActionError {
    /// The notification does not offer this action; nothing was attempted.
    #[error("action '{action}' is not offered for {source_type} notifications")]
    UnsupportedAction {
        /// The requested action.
        action: ActionKind,
        /// Source type of the notification.
        source_type: SourceType,
    },
    /// The domain mutation failed; nothing took effect.
    #[error("source mutation failed: {0}")]
    SourceMutation(AppError),
    /// The domain mutation took effect but the history entry was not written.
    #[error("history append failed after {attempts} attempt(s): {error}")]
    History {
        /// Attempts made.
        attempts: u32,
        /// Last failure.
        error: AppError,
    },
    /// The domain mutation took effect but the read state was not saved.
    #[error("read-state save failed after {attempts} attempt(s): {error}")]
    ReadState {
        /// Attempts made.
        attempts: u32,
        /// Last failure.
        error: AppError,
    },
    /// The aggregator was shut down before the action started.
    #[error("notification aggregator is closed")]
    Closed,
}

impl QuickActionError {
    /// Whether the error left the source record untouched.
    pub fn is_full_failure(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedAction { .. } | Self::SourceMutation(_) | Self::Closed
        )
    }
}
