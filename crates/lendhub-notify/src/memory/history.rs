//! In-memory history sink.

use std::sync::Mutex;
use std::sync::atomic::AtomicU32;

use async_trait::async_trait;
use tracing::debug;

use lendhub_core::error::AppError;
use lendhub_core::result::AppResult;
use lendhub_entity::history::HistoryEntry;

use super::take_failure;
use crate::traits::HistorySink;

/// Append-only vector of history entries.
#[derive(Debug, Default)]
pub struct MemoryHistorySink {
    entries: Mutex<Vec<HistoryEntry>>,
    fail_appends: AtomicU32,
}

impl MemoryHistorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` appends.
    pub fn fail_next(&self, n: u32) {
        self.fail_appends
            .store(n, std::sync::atomic::Ordering::SeqCst);
    }

    /// Every recorded entry, oldest first.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl HistorySink for MemoryHistorySink {
    async fn append(&self, entry: &HistoryEntry) -> AppResult<()> {
        if take_failure(&self.fail_appends) {
            return Err(AppError::storage("history append rejected"));
        }
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.iter().any(|e| e.id == entry.id) {
            return Ok(());
        }
        debug!(entry_id = %entry.id, action = %entry.action, "History entry appended");
        entries.push(entry.clone());
        Ok(())
    }
}
