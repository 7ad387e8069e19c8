//! LendHub notification daemon.
//!
//! Runs one administrator's notification aggregator over in-memory
//! collections and logs arrivals and badge counts until shut down.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use tracing_subscriber::{EnvFilter, fmt};

use lendhub_core::config::AppConfig;
use lendhub_core::error::AppError;
use lendhub_core::types::id::AdminId;
use lendhub_entity::source::{RawRecord, SourceType};
use lendhub_notify::memory::{
    MemoryFeedProvider, MemoryHistorySink, MemoryLendingService, MemoryReadStateStore,
};
use lendhub_notify::{AggregatorDeps, NotificationAggregator};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Daemon error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from files and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("LENDHUB_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if config.logging.is_json() {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .pretty()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting LendHub notification daemon v{}", env!("CARGO_PKG_VERSION"));

    let admin_id = match std::env::var("LENDHUB_ADMIN_ID") {
        Ok(raw) => raw
            .parse::<AdminId>()
            .map_err(|e| AppError::configuration(format!("Invalid LENDHUB_ADMIN_ID: {e}")))?,
        Err(_) => AdminId::new(),
    };

    let feeds = Arc::new(MemoryFeedProvider::new());
    seed(&feeds, admin_id);

    let deps = AggregatorDeps {
        feeds: feeds.clone(),
        read_states: Arc::new(MemoryReadStateStore::new()),
        history: Arc::new(MemoryHistorySink::new()),
        lending: Arc::new(MemoryLendingService::new(Arc::clone(&feeds))),
    };

    let aggregator = NotificationAggregator::start(admin_id, deps, &config).await?;
    aggregator.on_new_arrival(|summary| {
        tracing::info!(
            priority = %summary.priority,
            link = %summary.link,
            "New notification: {}: {}",
            summary.title,
            summary.message
        );
    })?;

    let mut changes = aggregator.changes();
    let reporter = async {
        while changes.changed().await.is_ok() {
            if aggregator.is_loading() {
                continue;
            }
            let counts = aggregator.counts();
            tracing::info!(
                total = counts.total,
                unread = counts.unread,
                action_items = counts.unread_action_items,
                personal = counts.unread_personal,
                "Notification counts"
            );
        }
    };

    tokio::select! {
        _ = reporter => {},
        _ = shutdown_signal() => {},
    }

    tracing::info!("Shutdown signal received");
    aggregator.shutdown().await;

    let metrics = aggregator.metrics();
    tracing::info!(
        snapshots = metrics.snapshots_applied,
        arrivals = metrics.arrivals_emitted,
        feed_errors = metrics.feed_errors,
        "LendHub notification daemon shut down gracefully"
    );
    Ok(())
}

/// Populate the in-memory collections with a small working set.
fn seed(feeds: &MemoryFeedProvider, admin_id: AdminId) {
    let now = Utc::now();
    let ago = |hours: i64| (now - Duration::hours(hours)).to_rfc3339();

    feeds.publish(
        SourceType::UserRegistration,
        vec![RawRecord::new(
            "user-001",
            json!({"status": "pending", "firstName": "Somchai", "lastName": "Jaidee",
                   "email": "somchai@example.com", "createdAt": ago(5)}),
        )],
    );
    feeds.publish(
        SourceType::LoanRequest,
        vec![RawRecord::new(
            "loan-001",
            json!({"status": "pending", "userName": "Anan", "equipmentName": "Canon EOS R6",
                   "borrowDate": "2024-06-10", "dueDate": "2024-06-17",
                   "purpose": "Field trip", "createdAt": ago(2)}),
        )],
    );
    feeds.publish(
        SourceType::OverdueLoan,
        vec![RawRecord::new(
            "loan-000",
            json!({"status": "overdue", "userName": "Bee", "equipmentName": "Tripod",
                   "dueDate": (now - Duration::days(3)).format("%Y-%m-%d").to_string(),
                   "createdAt": ago(240)}),
        )],
    );
    feeds.publish(SourceType::ReservationRequest, Vec::new());
    feeds.publish(
        SourceType::Personal,
        vec![RawRecord::new(
            "msg-001",
            json!({"recipientId": admin_id.to_string(), "type": "announcement",
                   "title": "ปิดปรับปรุงระบบ", "message": "ระบบจะปิดปรับปรุงคืนวันศุกร์",
                   "createdAt": ago(1)}),
        )],
    );
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
