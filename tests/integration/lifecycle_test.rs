//! Integration tests for aggregator start-up and teardown.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use lendhub_core::error::ErrorKind;
use lendhub_core::result::AppResult;
use lendhub_core::types::id::{NotificationId, SourceId};
use lendhub_entity::notification::ActionKind;
use lendhub_entity::source::SourceType;
use lendhub_notify::memory::MemoryLendingService;
use lendhub_notify::traits::LendingService;
use lendhub_notify::{NotificationAggregator, QuickActionError};

use helpers::{TestEnv, loan, settle, wait_until};

/// Lending service that waits before every approval
struct SlowLending {
    inner: Arc<MemoryLendingService>,
    delay: Duration,
}

#[async_trait]
impl LendingService for SlowLending {
    async fn approve(&self, source_type: SourceType, source_id: &SourceId) -> AppResult<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.approve(source_type, source_id).await
    }

    async fn reject(
        &self,
        source_type: SourceType,
        source_id: &SourceId,
        reason: Option<&str>,
    ) -> AppResult<()> {
        self.inner.reject(source_type, source_id, reason).await
    }

    async fn mark_returned(&self, source_id: &SourceId) -> AppResult<()> {
        self.inner.mark_returned(source_id).await
    }
}

#[tokio::test]
async fn test_one_subscription_per_enabled_feed() {
    let mut env = TestEnv::new();
    env.config.feeds.enabled_sources = vec!["loan_request".to_string(), "personal".to_string()];
    let aggregator = env.start_loaded().await;

    assert_eq!(env.feeds.subscriber_count(), 2);
    aggregator.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_releases_every_subscription() {
    let env = TestEnv::new();
    let aggregator = env.start_loaded().await;
    assert_eq!(env.feeds.subscriber_count(), SourceType::ALL.len());

    aggregator.shutdown().await;
    assert_eq!(env.feeds.subscriber_count(), 0);
    assert!(aggregator.is_closed());
}

#[tokio::test]
async fn test_drop_releases_every_subscription() {
    let env = TestEnv::new();
    let aggregator = env.start_loaded().await;
    drop(aggregator);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while env.feeds.subscriber_count() > 0 {
        assert!(tokio::time::Instant::now() < deadline, "subscriptions leaked");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn test_snapshots_after_shutdown_are_ignored() {
    let env = TestEnv::new();
    env.feeds.publish(SourceType::LoanRequest, vec![loan("L1", 0)]);
    let aggregator = env.start_loaded().await;
    aggregator.shutdown().await;

    env.feeds.upsert(SourceType::LoanRequest, loan("L2", 5));
    settle().await;
    assert_eq!(aggregator.notifications().len(), 1);
}

#[tokio::test]
async fn test_operations_after_shutdown_are_refused() {
    let env = TestEnv::new();
    env.feeds.publish(SourceType::LoanRequest, vec![loan("L1", 0)]);
    let aggregator = env.start_loaded().await;
    let notification = aggregator.notifications()[0].clone();
    aggregator.shutdown().await;

    let err = aggregator
        .mark_as_read(notification.id)
        .await
        .expect_err("closed");
    assert_eq!(err.kind, ErrorKind::ServiceUnavailable);

    let outcome = aggregator
        .execute_quick_action(&notification, ActionKind::Approve, None)
        .await;
    assert!(matches!(outcome.error, Some(QuickActionError::Closed)));
    assert!(env.lending.calls().is_empty());
}

#[tokio::test]
async fn test_shutdown_during_quick_action_discards_view_update() {
    let env = TestEnv::new();
    env.feeds.publish(SourceType::LoanRequest, vec![loan("L1", 0)]);
    let mut deps = env.deps();
    deps.lending = Arc::new(SlowLending {
        inner: Arc::clone(&env.lending),
        delay: Duration::from_millis(200),
    });
    let aggregator = Arc::new(
        NotificationAggregator::start(env.admin, deps, &env.config)
            .await
            .expect("start"),
    );
    wait_until(&aggregator, |a| !a.is_loading()).await;
    let notification = aggregator.notifications()[0].clone();

    let in_flight = {
        let aggregator = Arc::clone(&aggregator);
        let notification = notification.clone();
        tokio::spawn(async move {
            aggregator
                .execute_quick_action(&notification, ActionKind::Approve, None)
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    aggregator.shutdown().await;
    assert_eq!(env.feeds.subscriber_count(), 0);

    let outcome = in_flight.await.expect("join");
    assert!(outcome.source_mutation_ok);
    let status = env
        .feeds
        .record(SourceType::LoanRequest, "L1")
        .and_then(|r| r.str_field(&["status"]).map(str::to_string));
    assert_eq!(status.as_deref(), Some("approved"));
    assert_eq!(env.history.entries().len(), 1);

    // The torn-down view was not updated.
    assert!(
        aggregator
            .find(notification.id)
            .is_some_and(|n| n.is_unread())
    );
    assert_eq!(env.feeds.subscriber_count(), 0);
}

#[tokio::test]
async fn test_unknown_source_name_fails_start() {
    let mut env = TestEnv::new();
    env.config.feeds.enabled_sources = vec!["loans".to_string()];

    let err = NotificationAggregator::start(env.admin, env.deps(), &env.config)
        .await
        .expect_err("unknown source");
    assert_eq!(err.kind, ErrorKind::Configuration);
}

#[tokio::test]
async fn test_changes_revision_advances() {
    let env = TestEnv::new();
    let aggregator = env.start_loaded().await;
    let mut changes = aggregator.changes();
    let before = *changes.borrow_and_update();

    env.feeds.upsert(SourceType::LoanRequest, loan("L1", 0));
    tokio::time::timeout(Duration::from_secs(5), changes.changed())
        .await
        .expect("timeout")
        .expect("sender alive");
    assert!(*changes.borrow() > before);
    assert!(
        aggregator
            .find(NotificationId::derive("loan_request", "L1"))
            .is_some()
    );
}
