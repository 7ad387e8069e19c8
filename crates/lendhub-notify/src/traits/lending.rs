//! Domain mutation service trait.

use async_trait::async_trait;

use lendhub_core::result::AppResult;
use lendhub_core::types::id::SourceId;
use lendhub_entity::source::SourceType;

/// The lending domain service that owns registrations, loans, and reservations.
///
/// Each call is an externally visible mutation; the engine never retries it.
#[async_trait]
pub trait LendingService: Send + Sync + 'static {
    /// Approve a pending registration, loan request, or reservation.
    async fn approve(&self, source_type: SourceType, source_id: &SourceId) -> AppResult<()>;

    /// Reject a pending registration, loan request, or reservation.
    async fn reject(
        &self,
        source_type: SourceType,
        source_id: &SourceId,
        reason: Option<&str>,
    ) -> AppResult<()>;

    /// Record that the equipment of an overdue loan was returned.
    async fn mark_returned(&self, source_id: &SourceId) -> AppResult<()>;
}
