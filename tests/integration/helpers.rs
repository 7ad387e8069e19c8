//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

use lendhub_core::config::AppConfig;
use lendhub_core::types::id::AdminId;
use lendhub_entity::source::{RawRecord, SourceType};
use lendhub_notify::memory::{
    MemoryFeedProvider, MemoryHistorySink, MemoryLendingService, MemoryReadStateStore,
};
use lendhub_notify::{AggregatorDeps, ArrivalSummary, NotificationAggregator};

/// In-memory collaborators of one test administrator
pub struct TestEnv {
    /// Source collections
    pub feeds: Arc<MemoryFeedProvider>,
    /// Read-state store
    pub read_states: Arc<MemoryReadStateStore>,
    /// History sink
    pub history: Arc<MemoryHistorySink>,
    /// Lending service
    pub lending: Arc<MemoryLendingService>,
    /// The administrator
    pub admin: AdminId,
    /// Configuration used by `start`
    pub config: AppConfig,
}

impl TestEnv {
    /// Create a new environment with every collection published empty
    pub fn new() -> Self {
        let feeds = Arc::new(MemoryFeedProvider::new());
        for source_type in SourceType::ALL {
            feeds.publish(source_type, Vec::new());
        }
        let mut config = AppConfig::default();
        config.notifications.follow_up_backoff_ms = 0;

        Self {
            lending: Arc::new(MemoryLendingService::new(Arc::clone(&feeds))),
            feeds,
            read_states: Arc::new(MemoryReadStateStore::new()),
            history: Arc::new(MemoryHistorySink::new()),
            admin: AdminId::new(),
            config,
        }
    }

    /// Collaborators for an aggregator
    pub fn deps(&self) -> AggregatorDeps {
        AggregatorDeps {
            feeds: self.feeds.clone(),
            read_states: self.read_states.clone(),
            history: self.history.clone(),
            lending: self.lending.clone(),
        }
    }

    /// Start an aggregator without waiting for the feeds
    pub async fn start(&self) -> NotificationAggregator {
        NotificationAggregator::start(self.admin, self.deps(), &self.config)
            .await
            .expect("Failed to start aggregator")
    }

    /// Start an aggregator and wait until every feed has reported
    pub async fn start_loaded(&self) -> NotificationAggregator {
        let aggregator = self.start().await;
        wait_until(&aggregator, |a| !a.is_loading()).await;
        aggregator
    }

    /// A personal message addressed to this environment's administrator
    pub fn personal(&self, id: &str, kind: &str, title: &str) -> RawRecord {
        RawRecord::new(
            id,
            json!({
                "recipientId": self.admin.to_string(),
                "type": kind,
                "title": title,
                "message": format!("{title} message"),
                "createdAt": base_time().to_rfc3339(),
            }),
        )
    }
}

/// A fixed reference time
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap()
}

/// A pending loan request created `minutes` after the reference time
pub fn loan(id: &str, minutes: i64) -> RawRecord {
    RawRecord::new(
        id,
        json!({
            "status": "pending",
            "userName": "Anan",
            "equipmentName": "Camera",
            "borrowDate": "2024-06-12",
            "dueDate": "2024-06-19",
            "createdAt": (base_time() + chrono::Duration::minutes(minutes)).to_rfc3339(),
        }),
    )
}

/// An overdue loan
pub fn overdue(id: &str) -> RawRecord {
    RawRecord::new(
        id,
        json!({
            "status": "overdue",
            "userName": "Bee",
            "equipmentName": "Tripod",
            "dueDate": "2024-06-01",
        }),
    )
}

/// Wait until `pred` holds, re-checking on every view change
pub async fn wait_until<F>(aggregator: &NotificationAggregator, pred: F)
where
    F: Fn(&NotificationAggregator) -> bool,
{
    let mut changes = aggregator.changes();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if pred(aggregator) {
            return;
        }
        match tokio::time::timeout_at(deadline, changes.changed()).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) | Err(_) => panic!("Condition not reached before timeout"),
        }
    }
}

/// Let spawned tasks run until the view stops changing
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Register a callback that records every arrival
pub fn record_arrivals(aggregator: &NotificationAggregator) -> Arc<Mutex<Vec<ArrivalSummary>>> {
    let arrivals = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&arrivals);
    aggregator
        .on_new_arrival(move |summary| sink.lock().unwrap().push(summary))
        .expect("Failed to register arrival callback");
    arrivals
}
