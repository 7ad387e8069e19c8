//! Integration tests for the live notification view.

mod helpers;

use lendhub_core::error::AppError;
use lendhub_entity::notification::{NotificationCategory, NotificationPriority};
use lendhub_entity::read_state::ReadState;
use lendhub_entity::source::SourceType;
use lendhub_notify::{FilterSpec, NotificationTab};

use helpers::{TestEnv, base_time, loan, overdue, record_arrivals, settle, wait_until};

#[tokio::test]
async fn test_loading_until_every_feed_reports() {
    let env = TestEnv::new();
    let aggregator = env.start().await;
    assert!(aggregator.is_loading());

    wait_until(&aggregator, |a| !a.is_loading()).await;
    assert!(aggregator.notifications().is_empty());
}

#[tokio::test]
async fn test_initial_snapshot_is_not_announced() {
    let env = TestEnv::new();
    env.feeds.publish(
        SourceType::LoanRequest,
        (1..=5).map(|i| loan(&format!("L{i}"), i)).collect(),
    );

    let aggregator = env.start().await;
    let arrivals = record_arrivals(&aggregator);
    wait_until(&aggregator, |a| !a.is_loading()).await;

    assert_eq!(aggregator.notifications().len(), 5);
    assert!(arrivals.lock().unwrap().is_empty());
    assert_eq!(aggregator.metrics().arrivals_emitted, 0);
}

#[tokio::test]
async fn test_swap_with_unchanged_count_announces_newcomer() {
    let env = TestEnv::new();
    env.feeds.publish(
        SourceType::LoanRequest,
        (1..=5).map(|i| loan(&format!("L{i}"), i)).collect(),
    );
    let aggregator = env.start().await;
    let arrivals = record_arrivals(&aggregator);
    wait_until(&aggregator, |a| !a.is_loading()).await;

    env.feeds.publish(
        SourceType::LoanRequest,
        (2..=6).map(|i| loan(&format!("L{i}"), i)).collect(),
    );
    wait_until(&aggregator, |a| a.metrics().arrivals_emitted == 1).await;

    let arrivals = arrivals.lock().unwrap().clone();
    assert_eq!(arrivals.len(), 1);
    assert!(arrivals[0].link.ends_with("highlight=L6"));
    assert_eq!(arrivals[0].priority, NotificationPriority::High);
    assert_eq!(aggregator.notifications().len(), 5);
}

#[tokio::test]
async fn test_new_loan_sorts_before_older_one() {
    let env = TestEnv::new();
    env.feeds.publish(SourceType::LoanRequest, vec![loan("L1", 0)]);
    let aggregator = env.start().await;
    let arrivals = record_arrivals(&aggregator);
    wait_until(&aggregator, |a| !a.is_loading()).await;

    let first = aggregator.notifications();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].category, NotificationCategory::Loans);
    assert_eq!(first[0].priority, NotificationPriority::High);

    env.feeds.upsert(SourceType::LoanRequest, loan("L2", 10));
    wait_until(&aggregator, |a| a.notifications().len() == 2).await;

    let order: Vec<String> = aggregator
        .notifications()
        .iter()
        .map(|n| n.source_id.to_string())
        .collect();
    assert_eq!(order, vec!["L2", "L1"]);
    assert_eq!(arrivals.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_overdue_outranks_loans() {
    let env = TestEnv::new();
    env.feeds.publish(SourceType::LoanRequest, vec![loan("L1", 60)]);
    env.feeds.publish(SourceType::OverdueLoan, vec![overdue("O1")]);
    let aggregator = env.start_loaded().await;

    let list = aggregator.notifications();
    assert_eq!(list[0].source_type, SourceType::OverdueLoan);
    assert_eq!(list[0].priority, NotificationPriority::Urgent);
}

#[tokio::test]
async fn test_denied_feed_degrades_to_empty() {
    let env = TestEnv::new();
    env.feeds.publish(SourceType::LoanRequest, vec![loan("L1", 0)]);
    env.feeds
        .deny_subscriptions(SourceType::Personal, AppError::authorization("permission denied"));

    let aggregator = env.start_loaded().await;
    assert_eq!(aggregator.notifications().len(), 1);
    assert_eq!(aggregator.counts().personal, 0);
    assert_eq!(aggregator.metrics().feed_errors, 1);
}

#[tokio::test]
async fn test_feed_error_then_recovery_only_announces_new_ids() {
    let env = TestEnv::new();
    env.feeds.publish(SourceType::LoanRequest, vec![loan("L1", 0)]);
    let aggregator = env.start().await;
    let arrivals = record_arrivals(&aggregator);
    wait_until(&aggregator, |a| !a.is_loading()).await;

    env.feeds
        .fail(SourceType::LoanRequest, AppError::feed("listener disconnected"));
    wait_until(&aggregator, |a| a.notifications().is_empty()).await;

    env.feeds.upsert(SourceType::LoanRequest, loan("L2", 5));
    wait_until(&aggregator, |a| a.notifications().len() == 2).await;

    let arrivals = arrivals.lock().unwrap().clone();
    assert_eq!(arrivals.len(), 1);
    assert!(arrivals[0].link.ends_with("highlight=L2"));
}

#[tokio::test]
async fn test_filter_change_resets_window() {
    let mut env = TestEnv::new();
    env.config.notifications.page_size = 2;
    env.feeds.publish(
        SourceType::LoanRequest,
        (1..=5).map(|i| loan(&format!("L{i}"), i)).collect(),
    );
    env.feeds.publish(SourceType::OverdueLoan, vec![overdue("O1")]);
    let aggregator = env.start_loaded().await;

    assert_eq!(aggregator.notifications().len(), 2);
    aggregator.load_more();
    aggregator.load_more();
    assert_eq!(aggregator.notifications().len(), 6);
    assert!(!aggregator.has_more());

    aggregator.set_filter(FilterSpec {
        category: Some(NotificationCategory::Loans),
        ..FilterSpec::default()
    });
    assert_eq!(aggregator.notifications().len(), 2);
    assert_eq!(aggregator.filtered_count(), 5);
    assert!(aggregator.has_more());
    assert_eq!(aggregator.filter().category, Some(NotificationCategory::Loans));
}

#[tokio::test]
async fn test_tabs_partition_the_view() {
    let env = TestEnv::new();
    env.feeds.publish(SourceType::LoanRequest, vec![loan("L1", 0), loan("L2", 1)]);
    env.feeds.publish(
        SourceType::Personal,
        vec![env.personal("P1", "announcement", "Library closed")],
    );
    let aggregator = env.start_loaded().await;

    aggregator.set_filter(FilterSpec::tab(NotificationTab::ActionItems));
    let action = aggregator.filtered_count();
    aggregator.set_filter(FilterSpec::tab(NotificationTab::Personal));
    let personal = aggregator.filtered_count();
    aggregator.set_filter(FilterSpec::default());

    assert_eq!(action, 2);
    assert_eq!(personal, 1);
    assert_eq!(aggregator.filtered_count(), action + personal);
}

#[tokio::test]
async fn test_personal_mirror_of_action_item_is_hidden() {
    let env = TestEnv::new();
    env.feeds.publish(SourceType::LoanRequest, vec![loan("L1", 0)]);
    env.feeds.publish(
        SourceType::Personal,
        vec![
            env.personal("P1", "loan_request", "New loan request"),
            env.personal("P2", "loan_approved", "Your loan was approved"),
        ],
    );
    let aggregator = env.start_loaded().await;

    let counts = aggregator.counts();
    assert_eq!(counts.total, 2);
    assert_eq!(counts.personal, 1);
    assert_eq!(aggregator.metrics().records_suppressed, 1);
}

#[tokio::test]
async fn test_mark_as_read_is_idempotent() {
    let env = TestEnv::new();
    env.feeds.publish(SourceType::LoanRequest, vec![loan("L1", 0), loan("L2", 1)]);
    let aggregator = env.start_loaded().await;
    let id = aggregator.notifications()[0].id;

    aggregator.mark_as_read(id).await.expect("mark read");
    let read_at = aggregator.find(id).and_then(|n| n.read_at);
    aggregator.mark_as_read(id).await.expect("mark read again");

    assert_eq!(aggregator.find(id).and_then(|n| n.read_at), read_at);
    assert_eq!(env.read_states.write_count(), 1);
    assert!(env.read_states.get(env.admin, id).is_some_and(|s| s.is_read));
    assert_eq!(aggregator.counts().unread, 1);
}

#[tokio::test]
async fn test_mark_unknown_notification_fails() {
    let env = TestEnv::new();
    let aggregator = env.start_loaded().await;
    let id = lendhub_core::types::id::NotificationId::derive("loan_request", "missing");
    assert!(aggregator.mark_as_read(id).await.is_err());
}

#[tokio::test]
async fn test_read_state_survives_new_snapshots() {
    let env = TestEnv::new();
    env.feeds.publish(SourceType::LoanRequest, vec![loan("L1", 0)]);
    let aggregator = env.start_loaded().await;
    let id = aggregator.notifications()[0].id;
    aggregator.mark_as_read(id).await.expect("mark read");

    env.feeds.upsert(SourceType::LoanRequest, loan("L2", 5));
    wait_until(&aggregator, |a| a.notifications().len() == 2).await;

    assert!(aggregator.find(id).is_some_and(|n| n.is_read));
}

#[tokio::test]
async fn test_stored_read_states_are_loaded_on_start() {
    let env = TestEnv::new();
    env.feeds.publish(SourceType::LoanRequest, vec![loan("L1", 0)]);
    let id = lendhub_core::types::id::NotificationId::derive("loan_request", "L1");
    env.read_states
        .insert(env.admin, id, ReadState::read_at(base_time()));

    let aggregator = env.start_loaded().await;
    let n = aggregator.find(id).expect("L1");
    assert!(n.is_read);
    assert_eq!(n.read_at, Some(base_time()));
}

#[tokio::test]
async fn test_read_state_load_failure_shows_everything_unread() {
    let env = TestEnv::new();
    env.feeds.publish(SourceType::LoanRequest, vec![loan("L1", 0)]);
    let id = lendhub_core::types::id::NotificationId::derive("loan_request", "L1");
    env.read_states
        .insert(env.admin, id, ReadState::read_at(base_time()));
    env.read_states.set_fail_loads(true);

    let aggregator = env.start_loaded().await;
    assert_eq!(aggregator.counts().unread, 1);
}

#[tokio::test]
async fn test_save_failure_keeps_optimistic_state() {
    let env = TestEnv::new();
    env.feeds.publish(SourceType::LoanRequest, vec![loan("L1", 0)]);
    let aggregator = env.start_loaded().await;
    let id = aggregator.notifications()[0].id;

    env.read_states.fail_next_saves(1);
    assert!(aggregator.mark_as_read(id).await.is_err());
    assert!(aggregator.find(id).is_some_and(|n| n.is_read));
    assert_eq!(aggregator.metrics().read_state_write_failures, 1);
}

#[tokio::test]
async fn test_mark_all_as_read_scoped_to_tab() {
    let env = TestEnv::new();
    env.feeds.publish(SourceType::LoanRequest, vec![loan("L1", 0), loan("L2", 1)]);
    env.feeds.publish(
        SourceType::Personal,
        vec![env.personal("P1", "announcement", "Library closed")],
    );
    let aggregator = env.start_loaded().await;

    let marked = aggregator
        .mark_all_as_read(NotificationTab::ActionItems)
        .await
        .expect("mark all");
    assert_eq!(marked, 2);

    let counts = aggregator.counts();
    assert_eq!(counts.unread_action_items, 0);
    assert_eq!(counts.unread_personal, 1);

    let again = aggregator
        .mark_all_as_read(NotificationTab::ActionItems)
        .await
        .expect("mark all again");
    assert_eq!(again, 0);
    assert_eq!(env.read_states.write_count(), 1);
}

#[tokio::test]
async fn test_counts_per_category() {
    let env = TestEnv::new();
    env.feeds.publish(SourceType::LoanRequest, vec![loan("L1", 0), loan("L2", 1)]);
    env.feeds.publish(SourceType::OverdueLoan, vec![overdue("O1")]);
    let aggregator = env.start_loaded().await;

    let counts = aggregator.counts();
    assert_eq!(counts.total, 3);
    assert_eq!(counts.per_category[&NotificationCategory::Loans].total, 2);
    assert_eq!(counts.per_category[&NotificationCategory::Overdue].unread, 1);
    assert!(!counts.per_category.contains_key(&NotificationCategory::System));
}

#[tokio::test]
async fn test_second_arrival_callback_is_rejected() {
    let env = TestEnv::new();
    let aggregator = env.start_loaded().await;
    let _arrivals = record_arrivals(&aggregator);
    assert!(aggregator.on_new_arrival(|_| {}).is_err());
}

#[tokio::test]
async fn test_disabled_arrival_callback_is_not_invoked() {
    let mut env = TestEnv::new();
    env.config.notifications.arrival_callback_enabled = false;
    let aggregator = env.start().await;
    let arrivals = record_arrivals(&aggregator);
    wait_until(&aggregator, |a| !a.is_loading()).await;

    env.feeds.upsert(SourceType::LoanRequest, loan("L1", 0));
    wait_until(&aggregator, |a| a.metrics().arrivals_emitted == 1).await;
    settle().await;
    assert!(arrivals.lock().unwrap().is_empty());
}
