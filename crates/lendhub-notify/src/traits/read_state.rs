//! Read-state persistence trait.

use std::collections::HashMap;

use async_trait::async_trait;

use lendhub_core::result::AppResult;
use lendhub_core::types::id::{AdminId, NotificationId};
use lendhub_entity::read_state::ReadState;

/// Durable per-administrator map of notification id to read state.
///
/// Writes are keyed by `(admin_id, notification_id)` and idempotent, so
/// implementations need no cross-key coordination.
#[async_trait]
pub trait ReadStateStore: Send + Sync + 'static {
    /// Load every stored read state of an administrator.
    async fn load(&self, admin_id: AdminId) -> AppResult<HashMap<NotificationId, ReadState>>;

    /// Store one read state.
    async fn save(
        &self,
        admin_id: AdminId,
        notification_id: NotificationId,
        state: ReadState,
    ) -> AppResult<()>;

    /// Store several read states at once.
    async fn save_batch(
        &self,
        admin_id: AdminId,
        states: &[(NotificationId, ReadState)],
    ) -> AppResult<()>;
}
