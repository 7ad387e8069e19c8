//! Quick-action executor: source mutation, history entry, read state.
//!
//! The three steps run in order. A failed source mutation aborts the action
//! with nothing changed. Once the mutation succeeds it is externally visible
//! and never undone or repeated; the two follow-up steps are idempotent and
//! are retried a bounded number of times before the failure is reported.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

use lendhub_core::config::NotificationConfig;
use lendhub_core::error::AppError;
use lendhub_core::result::AppResult;
use lendhub_core::types::id::{AdminId, HistoryEntryId};
use lendhub_entity::history::HistoryEntry;
use lendhub_entity::notification::{ActionKind, Notification};
use lendhub_entity::read_state::ReadState;

use crate::error::QuickActionError;
use crate::metrics::EngineMetrics;
use crate::traits::{HistorySink, LendingService, ReadStateStore};

/// Combined outcome of a quick action.
#[derive(Debug, Clone, Serialize)]
pub struct QuickActionOutcome {
    /// The source record was mutated.
    pub source_mutation_ok: bool,
    /// The history entry was appended.
    pub history_ok: bool,
    /// The read state was saved.
    pub read_state_ok: bool,
    /// First failure, if any step failed.
    #[serde(skip)]
    pub error: Option<QuickActionError>,
    /// Read state the notification should show after the action.
    #[serde(skip)]
    pub read_state: Option<ReadState>,
}

impl QuickActionOutcome {
    /// Outcome of an action that did not take effect.
    pub fn failed(error: QuickActionError) -> Self {
        Self {
            source_mutation_ok: false,
            history_ok: false,
            read_state_ok: false,
            error: Some(error),
            read_state: None,
        }
    }

    /// Every step succeeded.
    pub fn is_success(&self) -> bool {
        self.source_mutation_ok && self.history_ok && self.read_state_ok
    }

    /// The mutation took effect but a follow-up step failed.
    pub fn is_partial(&self) -> bool {
        self.source_mutation_ok && !(self.history_ok && self.read_state_ok)
    }
}

/// Executes quick actions against the lending service, history sink, and read-state store.
pub struct QuickActionExecutor {
    /// Domain service owning the source records.
    lending: Arc<dyn LendingService>,
    /// Audit trail.
    history: Arc<dyn HistorySink>,
    /// Read-state persistence.
    read_states: Arc<dyn ReadStateStore>,
    /// Retry policy for follow-up steps.
    config: NotificationConfig,
    /// Counters.
    metrics: Arc<EngineMetrics>,
}

impl std::fmt::Debug for QuickActionExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuickActionExecutor")
            .field("follow_up_attempts", &self.config.follow_up_attempts)
            .finish()
    }
}

impl QuickActionExecutor {
    /// Create a new executor.
    pub fn new(
        lending: Arc<dyn LendingService>,
        history: Arc<dyn HistorySink>,
        read_states: Arc<dyn ReadStateStore>,
        config: NotificationConfig,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            lending,
            history,
            read_states,
            config,
            metrics,
        }
    }

    /// Perform `action` on the source record of `notification` as `admin_id`.
    pub async fn execute(
        &self,
        admin_id: AdminId,
        notification: &Notification,
        action: ActionKind,
        reason: Option<&str>,
    ) -> QuickActionOutcome {
        if !notification.offers(action) {
            EngineMetrics::inc(&self.metrics.quick_actions_failed);
            return QuickActionOutcome::failed(QuickActionError::UnsupportedAction {
                action,
                source_type: notification.source_type,
            });
        }

        let reason = reason.map(str::trim).filter(|r| !r.is_empty());

        // Step 1: never retried.
        if let Err(e) = self.mutate_source(notification, action, reason).await {
            warn!(
                admin_id = %admin_id,
                notification_id = %notification.id,
                action = %action,
                error = %e,
                "Quick action failed at source mutation"
            );
            EngineMetrics::inc(&self.metrics.quick_actions_failed);
            return QuickActionOutcome::failed(QuickActionError::SourceMutation(e));
        }

        let now = Utc::now();
        let mut outcome = QuickActionOutcome {
            source_mutation_ok: true,
            history_ok: false,
            read_state_ok: false,
            error: None,
            read_state: None,
        };

        // Step 2
        let entry = HistoryEntry {
            id: HistoryEntryId::new(),
            actor_id: admin_id,
            action,
            target_type: notification.source_type,
            target_id: notification.source_id.clone(),
            notification_id: notification.id,
            reason: reason.map(str::to_string),
            created_at: now,
        };
        match self.with_retry(|| self.history.append(&entry)).await {
            Ok(()) => outcome.history_ok = true,
            Err((attempts, e)) => {
                error!(
                    notification_id = %notification.id,
                    attempts,
                    error = %e,
                    "History append failed after source mutation"
                );
                outcome.error = Some(QuickActionError::History { attempts, error: e });
            }
        }

        // Step 3
        let state = ReadState {
            is_read: notification.is_read,
            read_at: notification.read_at,
        }
        .mark_read(now);
        outcome.read_state = Some(state);
        match self
            .with_retry(|| self.read_states.save(admin_id, notification.id, state))
            .await
        {
            Ok(()) => outcome.read_state_ok = true,
            Err((attempts, e)) => {
                error!(
                    notification_id = %notification.id,
                    attempts,
                    error = %e,
                    "Read-state save failed after source mutation"
                );
                EngineMetrics::inc(&self.metrics.read_state_write_failures);
                outcome
                    .error
                    .get_or_insert(QuickActionError::ReadState { attempts, error: e });
            }
        }

        if outcome.is_success() {
            EngineMetrics::inc(&self.metrics.quick_actions_succeeded);
            info!(
                admin_id = %admin_id,
                notification_id = %notification.id,
                action = %action,
                "Quick action completed"
            );
        } else {
            EngineMetrics::inc(&self.metrics.quick_actions_partial);
            warn!(
                admin_id = %admin_id,
                notification_id = %notification.id,
                action = %action,
                history_ok = outcome.history_ok,
                read_state_ok = outcome.read_state_ok,
                "Quick action partially completed"
            );
        }

        outcome
    }

    async fn mutate_source(
        &self,
        notification: &Notification,
        action: ActionKind,
        reason: Option<&str>,
    ) -> AppResult<()> {
        let source_id = &notification.source_id;
        match action {
            ActionKind::Approve => self.lending.approve(notification.source_type, source_id).await,
            ActionKind::Reject => {
                self.lending
                    .reject(notification.source_type, source_id, reason)
                    .await
            }
            ActionKind::MarkReturned => self.lending.mark_returned(source_id).await,
        }
    }

    /// Run an idempotent step up to `follow_up_attempts` times.
    async fn with_retry<F, Fut>(&self, mut step: F) -> Result<(), (u32, AppError)>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<()>>,
    {
        let max_attempts = self.config.follow_up_attempts.max(1);
        let mut attempt = 1;
        loop {
            match step().await {
                Ok(()) => return Ok(()),
                Err(e) if attempt >= max_attempts => return Err((attempt, e)),
                Err(e) => {
                    warn!(attempt, max_attempts, error = %e, "Follow-up step failed, retrying");
                    tokio::time::sleep(self.config.follow_up_backoff(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}
