//! Audit/history sink trait.

use async_trait::async_trait;

use lendhub_core::result::AppResult;
use lendhub_entity::history::HistoryEntry;

/// Append-only store of administrative actions.
#[async_trait]
pub trait HistorySink: Send + Sync + 'static {
    /// Append an entry. Appending the same entry id twice must not create
    /// a second record.
    async fn append(&self, entry: &HistoryEntry) -> AppResult<()>;
}
