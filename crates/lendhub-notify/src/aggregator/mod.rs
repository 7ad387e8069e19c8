//! Per-administrator aggregation facade.
//!
//! [`NotificationAggregator::start`] loads the administrator's read states
//! and spawns one task per enabled feed. Each task applies its snapshots to
//! the shared [`AggregatorState`](state::AggregatorState) under a short
//! lock; queries read the already-merged view and never wait on a feed.

pub mod feed_task;
pub mod state;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use lendhub_core::config::{AppConfig, NotificationConfig};
use lendhub_core::error::AppError;
use lendhub_core::result::AppResult;
use lendhub_core::types::id::{AdminId, NotificationId};
use lendhub_entity::notification::{ActionKind, Notification};
use lendhub_entity::source::{FeedPredicate, FeedSnapshot, SourceType};

use crate::error::QuickActionError;
use crate::executor::{QuickActionExecutor, QuickActionOutcome};
use crate::metrics::{EngineMetrics, MetricsSnapshot};
use crate::notification::arrival::ArrivalSummary;
use crate::notification::filter::{FilterSpec, NotificationTab};
use crate::traits::{HistorySink, LendingService, ReadStateStore, SourceFeedProvider};

pub use state::{CategoryCount, NotificationCounts};

use self::state::AggregatorState;

/// Callback invoked once per genuinely new notification.
pub type ArrivalCallback = Box<dyn Fn(ArrivalSummary) + Send + Sync>;

/// Collaborators an aggregator is wired to.
#[derive(Clone)]
pub struct AggregatorDeps {
    /// Live source feeds.
    pub feeds: Arc<dyn SourceFeedProvider>,
    /// Read-state persistence.
    pub read_states: Arc<dyn ReadStateStore>,
    /// Audit trail for quick actions.
    pub history: Arc<dyn HistorySink>,
    /// Domain service mutated by quick actions.
    pub lending: Arc<dyn LendingService>,
}

impl std::fmt::Debug for AggregatorDeps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregatorDeps").finish()
    }
}

/// State shared between the facade and its feed tasks.
pub(crate) struct Shared {
    pub(crate) admin_id: AdminId,
    pub(crate) cancel: CancellationToken,
    state: Mutex<AggregatorState>,
    revision: watch::Sender<u64>,
    on_arrival: OnceLock<ArrivalCallback>,
    read_states: Arc<dyn ReadStateStore>,
    executor: QuickActionExecutor,
    metrics: Arc<EngineMetrics>,
    config: NotificationConfig,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, AggregatorState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }

    pub(crate) fn on_snapshot(&self, source_type: SourceType, snapshot: &FeedSnapshot) {
        let arrivals = {
            let mut state = self.lock();
            if state.is_closed() || self.cancel.is_cancelled() {
                return;
            }
            state.apply_snapshot(source_type, snapshot, &self.metrics)
        };
        self.bump();

        for arrival in arrivals {
            debug!(
                admin_id = %self.admin_id,
                source_type = %arrival.source_type,
                notification_id = %arrival.notification_id,
                "New notification arrived"
            );
            EngineMetrics::inc(&self.metrics.arrivals_emitted);
            if !self.config.arrival_callback_enabled {
                continue;
            }
            if let Some(callback) = self.on_arrival.get() {
                callback(arrival.summary);
            }
        }
    }

    pub(crate) fn on_feed_error(&self, source_type: SourceType) {
        EngineMetrics::inc(&self.metrics.feed_errors);
        {
            let mut state = self.lock();
            if state.is_closed() {
                return;
            }
            state.apply_failure(source_type);
        }
        self.bump();
    }

    pub(crate) fn on_feed_closed(&self, source_type: SourceType) {
        {
            let mut state = self.lock();
            if state.is_closed() {
                return;
            }
            state.apply_closed(source_type);
        }
        self.bump();
    }
}

/// Live, queryable notification view of one administrator.
pub struct NotificationAggregator {
    shared: Arc<Shared>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for NotificationAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationAggregator")
            .field("admin_id", &self.shared.admin_id)
            .field("closed", &self.shared.cancel.is_cancelled())
            .finish()
    }
}

impl NotificationAggregator {
    /// Load read states and subscribe to every enabled feed.
    ///
    /// A read-state load failure degrades to an empty map. Fails only on
    /// an unknown source name in `feeds.enabled_sources`.
    pub async fn start(admin_id: AdminId, deps: AggregatorDeps, config: &AppConfig) -> AppResult<Self> {
        let sources = parse_sources(&config.feeds.enabled_sources)?;

        let read_states = match deps.read_states.load(admin_id).await {
            Ok(states) => states,
            Err(e) => {
                warn!(
                    admin_id = %admin_id,
                    error = %e,
                    "Read-state load failed, treating every notification as unread"
                );
                HashMap::new()
            }
        };

        let metrics = Arc::new(EngineMetrics::new());
        let executor = QuickActionExecutor::new(
            deps.lending,
            deps.history,
            Arc::clone(&deps.read_states),
            config.notifications.clone(),
            Arc::clone(&metrics),
        );
        let (revision, _) = watch::channel(0u64);

        let shared = Arc::new(Shared {
            admin_id,
            cancel: CancellationToken::new(),
            state: Mutex::new(AggregatorState::new(
                &sources,
                read_states,
                config.notifications.page_size,
            )),
            revision,
            on_arrival: OnceLock::new(),
            read_states: deps.read_states,
            executor,
            metrics,
            config: config.notifications.clone(),
        });

        let tasks = sources
            .iter()
            .map(|&source_type| {
                tokio::spawn(feed_task::run_feed(
                    Arc::clone(&shared),
                    Arc::clone(&deps.feeds),
                    source_type,
                    FeedPredicate::for_source(source_type, admin_id),
                ))
            })
            .collect();

        info!(admin_id = %admin_id, feeds = sources.len(), "Notification aggregator started");

        Ok(Self {
            shared,
            tasks: Mutex::new(tasks),
        })
    }

    /// Administrator this view belongs to.
    pub fn admin_id(&self) -> AdminId {
        self.shared.admin_id
    }

    /// The current page of the filtered list.
    pub fn notifications(&self) -> Vec<Notification> {
        self.shared.lock().visible()
    }

    /// Number of notifications matching the active filter, across all pages.
    pub fn filtered_count(&self) -> usize {
        self.shared.lock().filtered_len()
    }

    /// A notification of the merged set by id.
    pub fn find(&self, id: NotificationId) -> Option<Notification> {
        self.shared.lock().find(id).cloned()
    }

    /// Badge counts over all notifications, ignoring the filter.
    pub fn counts(&self) -> NotificationCounts {
        self.shared.lock().counts()
    }

    /// True until every feed has delivered a snapshot or failed.
    pub fn is_loading(&self) -> bool {
        self.shared.lock().is_loading()
    }

    /// Active filter.
    pub fn filter(&self) -> FilterSpec {
        self.shared.lock().filter().clone()
    }

    /// Replace the filter. The window returns to the first page.
    pub fn set_filter(&self, spec: FilterSpec) {
        self.shared.lock().set_filter(spec);
        self.shared.bump();
    }

    /// Reveal one more page of the filtered list.
    pub fn load_more(&self) {
        if self.shared.lock().load_more() {
            self.shared.bump();
        }
    }

    /// Whether the filtered list extends past the window.
    pub fn has_more(&self) -> bool {
        self.shared.lock().has_more()
    }

    /// Mark one notification read.
    ///
    /// The in-memory view is updated first. A store failure is returned,
    /// but the notification stays read in memory.
    pub async fn mark_as_read(&self, id: NotificationId) -> AppResult<()> {
        let state = {
            let mut state = self.shared.lock();
            if state.is_closed() {
                return Err(closed());
            }
            if state.find(id).is_none() {
                return Err(AppError::not_found(format!("Notification {id} not found")));
            }
            state.mark_read(id, Utc::now())
        };
        let Some(read_state) = state else {
            return Ok(());
        };
        self.shared.bump();

        self.shared
            .read_states
            .save(self.shared.admin_id, id, read_state)
            .await
            .inspect_err(|e| self.log_write_failure(1, e))
    }

    /// Mark every unread notification of `tab` read, narrowed by the active
    /// filter's other predicates. Returns how many were newly marked.
    pub async fn mark_all_as_read(&self, tab: NotificationTab) -> AppResult<usize> {
        let marked = {
            let mut state = self.shared.lock();
            if state.is_closed() {
                return Err(closed());
            }
            state.mark_all_read(tab, Utc::now())
        };
        if marked.is_empty() {
            return Ok(0);
        }
        self.shared.bump();

        self.shared
            .read_states
            .save_batch(self.shared.admin_id, &marked)
            .await
            .inspect_err(|e| self.log_write_failure(marked.len(), e))?;
        Ok(marked.len())
    }

    fn log_write_failure(&self, count: usize, e: &AppError) {
        EngineMetrics::inc(&self.shared.metrics.read_state_write_failures);
        error!(
            admin_id = %self.shared.admin_id,
            count,
            error = %e,
            "Read-state save failed; keeping in-memory state"
        );
    }

    /// Run a quick action on `notification`.
    ///
    /// The view shows the notification read as soon as the source mutation
    /// succeeds, unless the aggregator was shut down meanwhile.
    pub async fn execute_quick_action(
        &self,
        notification: &Notification,
        action: ActionKind,
        reason: Option<&str>,
    ) -> QuickActionOutcome {
        // The caller's copy may predate a mark-read; start from the view.
        let current = {
            let state = self.shared.lock();
            if state.is_closed() {
                return QuickActionOutcome::failed(QuickActionError::Closed);
            }
            state.find(notification.id).cloned()
        };
        let notification = current.as_ref().unwrap_or(notification);

        let outcome = self
            .shared
            .executor
            .execute(self.shared.admin_id, notification, action, reason)
            .await;

        if let Some(read_state) = outcome.read_state {
            let applied = {
                let mut state = self.shared.lock();
                if state.is_closed() {
                    false
                } else {
                    state.set_read_state(notification.id, read_state);
                    true
                }
            };
            if applied {
                self.shared.bump();
            } else {
                debug!(
                    notification_id = %notification.id,
                    "Aggregator closed during quick action; discarding view update"
                );
            }
        }
        outcome
    }

    /// Register the arrival callback. Only one may be registered.
    pub fn on_new_arrival<F>(&self, callback: F) -> AppResult<()>
    where
        F: Fn(ArrivalSummary) + Send + Sync + 'static,
    {
        self.shared
            .on_arrival
            .set(Box::new(callback))
            .map_err(|_| AppError::conflict("An arrival callback is already registered"))
    }

    /// Receiver of a revision counter bumped on every view change.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    /// Engine counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_closed(&self) -> bool {
        self.shared.lock().is_closed()
    }

    /// Release every feed subscription and wait for the feed tasks to finish.
    ///
    /// In-flight quick actions complete their source mutation, but their
    /// view updates are discarded.
    pub async fn shutdown(&self) {
        self.shared.cancel.cancel();
        self.shared.lock().close();

        let tasks: Vec<JoinHandle<()>> =
            std::mem::take(&mut *self.tasks.lock().unwrap_or_else(|e| e.into_inner()));
        for task in tasks {
            if let Err(e) = task.await {
                warn!(admin_id = %self.shared.admin_id, error = %e, "Feed task ended abnormally");
            }
        }
        self.shared.bump();

        info!(admin_id = %self.shared.admin_id, "Notification aggregator shut down");
    }
}

impl Drop for NotificationAggregator {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
        self.shared.lock().close();
    }
}

fn closed() -> AppError {
    AppError::service_unavailable("Notification aggregator is closed")
}

/// Parse configured source names, keeping their order and dropping repeats.
fn parse_sources(names: &[String]) -> AppResult<Vec<SourceType>> {
    let mut sources = Vec::with_capacity(names.len());
    for name in names {
        let source_type = SourceType::from_str_value(name).ok_or_else(|| {
            AppError::configuration(format!("Unknown notification source '{name}'"))
        })?;
        if !sources.contains(&source_type) {
            sources.push(source_type);
        }
    }
    Ok(sources)
}
