//! In-memory source collections with live snapshot subscriptions.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use futures::StreamExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use lendhub_core::error::AppError;
use lendhub_core::result::AppResult;
use lendhub_entity::source::{FeedPredicate, FeedSnapshot, RawRecord, SourceType};

use crate::traits::{FeedSubscription, SourceFeedProvider};

/// Current contents of one collection.
#[derive(Debug, Clone, Default)]
struct CollectionState {
    /// Records in insertion order.
    records: Vec<RawRecord>,
    /// Set while the collection is failing; cleared by the next write.
    failure: Option<AppError>,
}

impl CollectionState {
    fn deliver(&self, source_type: SourceType, predicate: &FeedPredicate) -> AppResult<FeedSnapshot> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        let records = self
            .records
            .iter()
            .filter(|r| predicate.matches(r))
            .cloned()
            .collect();
        Ok(FeedSnapshot::new(source_type, records))
    }
}

/// Decrements the live-subscriber count when a stream is dropped.
struct SubscriberGuard(Arc<AtomicUsize>);

impl SubscriberGuard {
    fn register(count: &Arc<AtomicUsize>) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(count))
    }
}

impl Drop for SubscriberGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory feed provider.
///
/// Every subscription receives the current matching records immediately and
/// a fresh snapshot after every write to its collection. Intermediate
/// states may be coalesced, which is fine since each snapshot is complete.
#[derive(Debug, Default)]
pub struct MemoryFeedProvider {
    /// Source type → collection channel
    collections: DashMap<SourceType, watch::Sender<CollectionState>>,
    /// Subscribe failures to inject, by source type
    denied: DashMap<SourceType, AppError>,
    /// Live subscription streams
    subscribers: Arc<AtomicUsize>,
}

impl MemoryFeedProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    fn modify(&self, source_type: SourceType, f: impl FnOnce(&mut CollectionState)) {
        self.collections
            .entry(source_type)
            .or_insert_with(|| watch::Sender::new(CollectionState::default()))
            .send_modify(f);
    }

    /// Replace the whole collection.
    pub fn publish(&self, source_type: SourceType, records: Vec<RawRecord>) {
        debug!(source_type = %source_type, count = records.len(), "Publishing collection");
        self.modify(source_type, |state| {
            state.records = records;
            state.failure = None;
        });
    }

    /// Insert a record, or replace the record with the same id.
    pub fn upsert(&self, source_type: SourceType, record: RawRecord) {
        self.modify(source_type, |state| {
            match state.records.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record,
                None => state.records.push(record),
            }
            state.failure = None;
        });
    }

    /// Remove a record. Returns whether it existed.
    pub fn remove(&self, source_type: SourceType, id: &str) -> bool {
        let mut removed = false;
        self.modify(source_type, |state| {
            let before = state.records.len();
            state.records.retain(|r| r.id.as_str() != id);
            removed = state.records.len() != before;
        });
        removed
    }

    /// Set string fields of an existing record. Returns whether it existed.
    pub fn update_fields(&self, source_type: SourceType, id: &str, fields: &[(&str, &str)]) -> bool {
        self.update_fields_if(source_type, id, fields, |_| Ok(())).is_ok()
    }

    /// Set string fields of a record once `check` accepts its current value.
    ///
    /// The check and the write happen under one lock of the collection, so
    /// two callers racing on the same record cannot both pass the check.
    /// Subscribers are only notified when the record was written.
    pub fn update_fields_if<F>(
        &self,
        source_type: SourceType,
        id: &str,
        fields: &[(&str, &str)],
        check: F,
    ) -> AppResult<()>
    where
        F: FnOnce(&RawRecord) -> AppResult<()>,
    {
        let mut result = Err(AppError::not_found(format!(
            "{source_type} record '{id}' not found"
        )));
        self.collections
            .entry(source_type)
            .or_insert_with(|| watch::Sender::new(CollectionState::default()))
            .send_if_modified(|state| {
                let Some(record) = state.records.iter_mut().find(|r| r.id.as_str() == id) else {
                    return false;
                };
                if let Err(e) = check(&*record) {
                    result = Err(e);
                    return false;
                }
                if !record.fields.is_object() {
                    record.fields = serde_json::Value::Object(serde_json::Map::new());
                }
                for (key, value) in fields {
                    record.fields[*key] = serde_json::Value::String((*value).to_string());
                }
                result = Ok(());
                true
            });
        result
    }

    /// Set the `status` field of an existing record.
    pub fn set_status(&self, source_type: SourceType, id: &str, status: &str) -> bool {
        self.update_fields(source_type, id, &[("status", status)])
    }

    /// Current copy of a record.
    pub fn record(&self, source_type: SourceType, id: &str) -> Option<RawRecord> {
        let tx = self.collections.get(&source_type)?;
        let state = tx.value().borrow();
        state.records.iter().find(|r| r.id.as_str() == id).cloned()
    }

    /// Make every subscriber of `source_type` receive `error` until the next write.
    pub fn fail(&self, source_type: SourceType, error: AppError) {
        self.modify(source_type, |state| state.failure = Some(error));
    }

    /// Make future subscribe calls for `source_type` fail with `error`.
    pub fn deny_subscriptions(&self, source_type: SourceType, error: AppError) {
        self.denied.insert(source_type, error);
    }

    /// Allow subscriptions for `source_type` again.
    pub fn allow_subscriptions(&self, source_type: SourceType) {
        self.denied.remove(&source_type);
    }

    /// Number of live subscription streams.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceFeedProvider for MemoryFeedProvider {
    async fn subscribe(
        &self,
        source_type: SourceType,
        predicate: FeedPredicate,
    ) -> AppResult<FeedSubscription> {
        if let Some(err) = self.denied.get(&source_type) {
            return Err(err.value().clone());
        }

        let mut rx = self
            .collections
            .entry(source_type)
            .or_insert_with(|| watch::Sender::new(CollectionState::default()))
            .subscribe();
        // Deliver the current contents first.
        rx.mark_changed();

        let cancel = CancellationToken::new();
        let guard = SubscriberGuard::register(&self.subscribers);
        let stream = futures::stream::unfold(
            (rx, cancel.clone(), predicate, guard),
            move |(mut rx, cancel, predicate, guard)| async move {
                tokio::select! {
                    _ = cancel.cancelled() => None,
                    changed = rx.changed() => {
                        changed.ok()?;
                        let item = rx.borrow_and_update().deliver(source_type, &predicate);
                        Some((item, (rx, cancel, predicate, guard)))
                    }
                }
            },
        )
        .boxed();

        debug!(source_type = %source_type, "Feed subscription opened");
        Ok(FeedSubscription::new(stream, cancel))
    }
}
