//! Live source feed trait.

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio_util::sync::CancellationToken;

use lendhub_core::result::AppResult;
use lendhub_entity::source::{FeedPredicate, FeedSnapshot, SourceType};

/// Stream of full snapshots. An `Err` item reports a feed failure; the
/// stream may keep delivering afterwards if the feed recovers.
pub type SnapshotStream = BoxStream<'static, AppResult<FeedSnapshot>>;

/// Provider of live record feeds (Firestore-style listeners, polling
/// adapters, in-memory collections).
#[async_trait]
pub trait SourceFeedProvider: Send + Sync + 'static {
    /// Open a subscription delivering a snapshot of every record of
    /// `source_type` matching `predicate`, on every change.
    async fn subscribe(
        &self,
        source_type: SourceType,
        predicate: FeedPredicate,
    ) -> AppResult<FeedSubscription>;
}

/// An open feed subscription.
///
/// Cancelling (explicitly or by dropping the subscription) tells the
/// provider to stop delivering and release its listener.
pub struct FeedSubscription {
    /// Snapshot deliveries.
    pub stream: SnapshotStream,
    /// Cancellation shared with the provider.
    cancel: CancellationToken,
}

impl FeedSubscription {
    /// Create a subscription from a stream and the token the provider watches.
    pub fn new(stream: SnapshotStream, cancel: CancellationToken) -> Self {
        Self { stream, cancel }
    }

    /// Stop delivery.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the subscription has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for FeedSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for FeedSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedSubscription")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
