//! Integration tests for quick actions through the aggregator.

mod helpers;

use lendhub_entity::notification::ActionKind;
use lendhub_entity::source::SourceType;
use lendhub_notify::QuickActionError;

use helpers::{TestEnv, loan, overdue, wait_until};

fn status(env: &TestEnv, source_type: SourceType, id: &str) -> Option<String> {
    env.feeds
        .record(source_type, id)
        .and_then(|r| r.str_field(&["status"]).map(str::to_string))
}

#[tokio::test]
async fn test_approve_completes_every_step() {
    let env = TestEnv::new();
    env.feeds.publish(SourceType::LoanRequest, vec![loan("L1", 0)]);
    let aggregator = env.start_loaded().await;
    let notification = aggregator.notifications()[0].clone();

    let outcome = aggregator
        .execute_quick_action(&notification, ActionKind::Approve, None)
        .await;
    assert!(outcome.is_success(), "{outcome:?}");
    assert!(outcome.error.is_none());

    assert_eq!(status(&env, SourceType::LoanRequest, "L1").as_deref(), Some("approved"));
    let entries = env.history.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].actor_id, env.admin);
    assert_eq!(entries[0].notification_id, notification.id);
    assert!(
        env.read_states
            .get(env.admin, notification.id)
            .is_some_and(|s| s.is_read)
    );

    // The approved loan no longer matches the pending feed.
    wait_until(&aggregator, |a| a.notifications().is_empty()).await;
    assert_eq!(aggregator.metrics().quick_actions_succeeded, 1);
}

#[tokio::test]
async fn test_mark_returned_on_overdue_loan() {
    let env = TestEnv::new();
    env.feeds.publish(SourceType::OverdueLoan, vec![overdue("O1")]);
    let aggregator = env.start_loaded().await;
    let notification = aggregator.notifications()[0].clone();

    let outcome = aggregator
        .execute_quick_action(&notification, ActionKind::MarkReturned, None)
        .await;
    assert!(outcome.is_success());
    assert_eq!(status(&env, SourceType::OverdueLoan, "O1").as_deref(), Some("returned"));
}

#[tokio::test]
async fn test_source_failure_changes_nothing() {
    let env = TestEnv::new();
    env.feeds.publish(SourceType::LoanRequest, vec![loan("L1", 0)]);
    let aggregator = env.start_loaded().await;
    let notification = aggregator.notifications()[0].clone();
    env.lending.fail_next(1);

    let outcome = aggregator
        .execute_quick_action(&notification, ActionKind::Approve, None)
        .await;
    assert!(!outcome.source_mutation_ok);
    assert!(!outcome.history_ok);
    assert!(!outcome.read_state_ok);
    assert!(outcome.error.as_ref().is_some_and(QuickActionError::is_full_failure));

    assert!(env.history.entries().is_empty());
    assert_eq!(env.read_states.write_count(), 0);
    assert!(aggregator.find(notification.id).is_some_and(|n| n.is_unread()));
    assert_eq!(status(&env, SourceType::LoanRequest, "L1").as_deref(), Some("pending"));
}

#[tokio::test]
async fn test_history_failure_reports_partial_success() {
    let env = TestEnv::new();
    env.feeds.publish(SourceType::LoanRequest, vec![loan("L1", 0)]);
    let aggregator = env.start_loaded().await;
    let notification = aggregator.notifications()[0].clone();
    env.history.fail_next(u32::MAX);

    let outcome = aggregator
        .execute_quick_action(&notification, ActionKind::Reject, Some("out of stock"))
        .await;
    assert!(outcome.source_mutation_ok);
    assert!(!outcome.history_ok);
    assert!(outcome.read_state_ok);
    assert!(outcome.is_partial());
    assert!(matches!(
        outcome.error,
        Some(QuickActionError::History { attempts: 3, .. })
    ));

    // The mutation ran exactly once and was not undone.
    assert_eq!(env.lending.calls().len(), 1);
    assert_eq!(status(&env, SourceType::LoanRequest, "L1").as_deref(), Some("rejected"));
    assert_eq!(aggregator.metrics().quick_actions_partial, 1);
}

#[tokio::test]
async fn test_read_state_failure_reports_partial_success() {
    let env = TestEnv::new();
    env.feeds.publish(SourceType::LoanRequest, vec![loan("L1", 0)]);
    let aggregator = env.start_loaded().await;
    let notification = aggregator.notifications()[0].clone();
    env.read_states.fail_next_saves(u32::MAX);

    let outcome = aggregator
        .execute_quick_action(&notification, ActionKind::Approve, None)
        .await;
    assert!(outcome.source_mutation_ok);
    assert!(outcome.history_ok);
    assert!(!outcome.read_state_ok);
    assert!(matches!(
        outcome.error,
        Some(QuickActionError::ReadState { .. })
    ));
    assert_eq!(env.lending.calls().len(), 1);
}

#[tokio::test]
async fn test_transient_follow_up_failures_are_retried() {
    let env = TestEnv::new();
    env.feeds.publish(SourceType::LoanRequest, vec![loan("L1", 0)]);
    let aggregator = env.start_loaded().await;
    let notification = aggregator.notifications()[0].clone();
    env.history.fail_next(1);
    env.read_states.fail_next_saves(2);

    let outcome = aggregator
        .execute_quick_action(&notification, ActionKind::Approve, None)
        .await;
    assert!(outcome.is_success());
    assert_eq!(env.lending.calls().len(), 1);
}

#[tokio::test]
async fn test_stale_copy_keeps_first_read_time() {
    let env = TestEnv::new();
    env.feeds.publish(SourceType::LoanRequest, vec![loan("L1", 0)]);
    let aggregator = env.start_loaded().await;
    let stale = aggregator.notifications()[0].clone();

    aggregator.mark_as_read(stale.id).await.expect("mark read");
    let first = env
        .read_states
        .get(env.admin, stale.id)
        .and_then(|s| s.read_at)
        .expect("read_at");
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    // `stale` still shows the notification unread.
    assert!(stale.is_unread());
    let outcome = aggregator
        .execute_quick_action(&stale, ActionKind::Approve, None)
        .await;
    assert!(outcome.is_success());
    assert_eq!(outcome.read_state.and_then(|s| s.read_at), Some(first));
    assert_eq!(
        env.read_states.get(env.admin, stale.id).and_then(|s| s.read_at),
        Some(first)
    );
}

#[tokio::test]
async fn test_action_not_offered_is_refused() {
    let env = TestEnv::new();
    env.feeds.publish(SourceType::LoanRequest, vec![loan("L1", 0)]);
    let aggregator = env.start_loaded().await;
    let notification = aggregator.notifications()[0].clone();

    let outcome = aggregator
        .execute_quick_action(&notification, ActionKind::MarkReturned, None)
        .await;
    assert!(matches!(
        outcome.error,
        Some(QuickActionError::UnsupportedAction { .. })
    ));
    assert!(env.lending.calls().is_empty());
}

#[tokio::test]
async fn test_personal_notifications_offer_no_actions() {
    let env = TestEnv::new();
    env.feeds.publish(
        SourceType::Personal,
        vec![env.personal("P1", "announcement", "Library closed")],
    );
    let aggregator = env.start_loaded().await;
    let notification = aggregator.notifications()[0].clone();
    assert!(notification.quick_actions.is_empty());

    let outcome = aggregator
        .execute_quick_action(&notification, ActionKind::Approve, None)
        .await;
    assert!(!outcome.source_mutation_ok);
    assert!(env.lending.calls().is_empty());
}
