//! In-memory lending service operating on [`MemoryFeedProvider`] collections.

use std::sync::atomic::AtomicU32;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use lendhub_core::error::AppError;
use lendhub_core::result::AppResult;
use lendhub_core::types::id::SourceId;
use lendhub_entity::notification::ActionKind;
use lendhub_entity::source::SourceType;

use super::feed::MemoryFeedProvider;
use super::take_failure;
use crate::traits::LendingService;

/// One mutation attempt seen by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LendingCall {
    /// Requested decision.
    pub action: ActionKind,
    /// Collection of the target record.
    pub source_type: SourceType,
    /// Target record.
    pub source_id: SourceId,
    /// Rejection reason.
    pub reason: Option<String>,
}

/// Lending service that flips record statuses in memory.
///
/// Approving or rejecting moves the record out of `pending`; marking an
/// overdue loan returned moves it out of `overdue`. Either way the record
/// stops matching its feed predicate and leaves the notification list.
#[derive(Debug)]
pub struct MemoryLendingService {
    feeds: Arc<MemoryFeedProvider>,
    calls: Mutex<Vec<LendingCall>>,
    fail_calls: AtomicU32,
}

impl MemoryLendingService {
    /// Create a service over the given collections.
    pub fn new(feeds: Arc<MemoryFeedProvider>) -> Self {
        Self {
            feeds,
            calls: Mutex::new(Vec::new()),
            fail_calls: AtomicU32::new(0),
        }
    }

    /// Fail the next `n` calls without touching any record.
    pub fn fail_next(&self, n: u32) {
        self.fail_calls
            .store(n, std::sync::atomic::Ordering::SeqCst);
    }

    /// Every call attempted so far, oldest first.
    pub fn calls(&self) -> Vec<LendingCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record_call(
        &self,
        action: ActionKind,
        source_type: SourceType,
        source_id: &SourceId,
        reason: Option<&str>,
    ) -> AppResult<()> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(LendingCall {
                action,
                source_type,
                source_id: source_id.clone(),
                reason: reason.map(str::to_string),
            });
        if take_failure(&self.fail_calls) {
            return Err(AppError::external_service("lending service unavailable"));
        }
        Ok(())
    }

    fn transition(
        &self,
        source_type: SourceType,
        source_id: &SourceId,
        expected: &str,
        fields: &[(&str, &str)],
    ) -> AppResult<()> {
        self.feeds
            .update_fields_if(source_type, source_id.as_str(), fields, |record| {
                let status = record.str_field(&["status"]).unwrap_or_default();
                if status.eq_ignore_ascii_case(expected) {
                    Ok(())
                } else {
                    Err(AppError::conflict(format!(
                        "{source_type} record '{source_id}' is '{status}', expected '{expected}'"
                    )))
                }
            })
    }
}

#[async_trait]
impl LendingService for MemoryLendingService {
    async fn approve(&self, source_type: SourceType, source_id: &SourceId) -> AppResult<()> {
        self.record_call(ActionKind::Approve, source_type, source_id, None)?;
        if !source_type.is_action_item() || source_type == SourceType::OverdueLoan {
            return Err(AppError::validation(format!(
                "{source_type} records cannot be approved"
            )));
        }
        let now = Utc::now().to_rfc3339();
        self.transition(
            source_type,
            source_id,
            "pending",
            &[("status", "approved"), ("decidedAt", now.as_str())],
        )?;
        info!(source_type = %source_type, source_id = %source_id, "Record approved");
        Ok(())
    }

    async fn reject(
        &self,
        source_type: SourceType,
        source_id: &SourceId,
        reason: Option<&str>,
    ) -> AppResult<()> {
        self.record_call(ActionKind::Reject, source_type, source_id, reason)?;
        if !source_type.is_action_item() || source_type == SourceType::OverdueLoan {
            return Err(AppError::validation(format!(
                "{source_type} records cannot be rejected"
            )));
        }
        let now = Utc::now().to_rfc3339();
        self.transition(
            source_type,
            source_id,
            "pending",
            &[
                ("status", "rejected"),
                ("decidedAt", now.as_str()),
                ("rejectionReason", reason.unwrap_or_default()),
            ],
        )?;
        info!(source_type = %source_type, source_id = %source_id, "Record rejected");
        Ok(())
    }

    async fn mark_returned(&self, source_id: &SourceId) -> AppResult<()> {
        self.record_call(ActionKind::MarkReturned, SourceType::OverdueLoan, source_id, None)?;
        let now = Utc::now().to_rfc3339();
        self.transition(
            SourceType::OverdueLoan,
            source_id,
            "overdue",
            &[("status", "returned"), ("returnedAt", now.as_str())],
        )?;
        info!(source_id = %source_id, "Overdue loan returned");
        Ok(())
    }
}
