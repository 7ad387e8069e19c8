//! In-memory collaborator implementations for single-node deployments and tests.

pub mod feed;
pub mod history;
pub mod lending;
pub mod read_state;

use std::sync::atomic::{AtomicU32, Ordering};

pub use feed::MemoryFeedProvider;
pub use history::MemoryHistorySink;
pub use lending::{LendingCall, MemoryLendingService};
pub use read_state::MemoryReadStateStore;

/// Consume one injected failure, if any remain.
fn take_failure(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}
