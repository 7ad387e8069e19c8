//! Per-feed subscription loop.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, info, warn};

use lendhub_entity::source::{FeedPredicate, SourceType};

use super::Shared;
use crate::traits::SourceFeedProvider;

/// Subscribe to one feed and apply its deliveries until cancelled or the
/// stream ends. The subscription is released when this returns.
pub(crate) async fn run_feed(
    shared: Arc<Shared>,
    provider: Arc<dyn SourceFeedProvider>,
    source_type: SourceType,
    predicate: FeedPredicate,
) {
    let subscribed = tokio::select! {
        _ = shared.cancel.cancelled() => return,
        result = provider.subscribe(source_type, predicate) => result,
    };

    let mut subscription = match subscribed {
        Ok(subscription) => subscription,
        Err(e) => {
            warn!(
                admin_id = %shared.admin_id,
                source_type = %source_type,
                error = %e,
                "Feed subscription failed"
            );
            shared.on_feed_error(source_type);
            return;
        }
    };
    debug!(admin_id = %shared.admin_id, source_type = %source_type, "Feed subscribed");

    loop {
        let next = tokio::select! {
            _ = shared.cancel.cancelled() => break,
            next = subscription.stream.next() => next,
        };

        match next {
            Some(Ok(snapshot)) => shared.on_snapshot(source_type, &snapshot),
            Some(Err(e)) => {
                warn!(
                    admin_id = %shared.admin_id,
                    source_type = %source_type,
                    error = %e,
                    "Feed delivered an error"
                );
                shared.on_feed_error(source_type);
            }
            None => {
                info!(admin_id = %shared.admin_id, source_type = %source_type, "Feed stream ended");
                shared.on_feed_closed(source_type);
                break;
            }
        }
    }

    subscription.cancel();
    debug!(admin_id = %shared.admin_id, source_type = %source_type, "Feed subscription released");
}
