//! In-memory read-state store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use lendhub_core::error::AppError;
use lendhub_core::result::AppResult;
use lendhub_core::types::id::{AdminId, NotificationId};
use lendhub_entity::read_state::ReadState;

use super::take_failure;
use crate::traits::ReadStateStore;

/// Read states keyed by administrator, with failure injection.
#[derive(Debug, Default)]
pub struct MemoryReadStateStore {
    /// Admin → notification → state
    states: DashMap<AdminId, HashMap<NotificationId, ReadState>>,
    /// Fail every load while set
    fail_loads: AtomicBool,
    /// Remaining writes to fail
    fail_saves: AtomicU32,
    /// Successful writes
    writes: AtomicU64,
}

impl MemoryReadStateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored state of one notification.
    pub fn get(&self, admin_id: AdminId, notification_id: NotificationId) -> Option<ReadState> {
        self.states
            .get(&admin_id)
            .and_then(|states| states.value().get(&notification_id).copied())
    }

    /// Seed a state without counting it as a write.
    pub fn insert(&self, admin_id: AdminId, notification_id: NotificationId, state: ReadState) {
        self.states
            .entry(admin_id)
            .or_default()
            .insert(notification_id, state);
    }

    /// Make loads fail (or succeed again).
    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    /// Fail the next `n` writes; a batch write counts as one.
    pub fn fail_next_saves(&self, n: u32) {
        self.fail_saves.store(n, Ordering::SeqCst);
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReadStateStore for MemoryReadStateStore {
    async fn load(&self, admin_id: AdminId) -> AppResult<HashMap<NotificationId, ReadState>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(AppError::storage("read-state store unavailable"));
        }
        Ok(self
            .states
            .get(&admin_id)
            .map(|states| states.value().clone())
            .unwrap_or_default())
    }

    async fn save(
        &self,
        admin_id: AdminId,
        notification_id: NotificationId,
        state: ReadState,
    ) -> AppResult<()> {
        self.save_batch(admin_id, &[(notification_id, state)]).await
    }

    async fn save_batch(
        &self,
        admin_id: AdminId,
        states: &[(NotificationId, ReadState)],
    ) -> AppResult<()> {
        if take_failure(&self.fail_saves) {
            return Err(AppError::storage("read-state write rejected"));
        }
        let mut entry = self.states.entry(admin_id).or_default();
        entry.extend(states.iter().copied());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
