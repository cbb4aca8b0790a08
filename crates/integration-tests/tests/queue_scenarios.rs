//! Queue scenarios end to end over SQLite
//!
//! Engine + SqliteQueueStore + SqliteServiceDirectory, seeded with the
//! default catalog.

use tokenline_core::application::{Notification, SubscriptionFilter};
use tokenline_core::domain::{QueuePhase, ServiceStatus};
use tokenline_core::error::AppError;
use tokenline_integration_tests::memory_harness;

const MESS: &str = "mens-mess-1";

/// Join on an empty queue, then a second member, then serve both
#[tokio::test]
async fn test_join_and_serve_walkthrough() {
    let h = memory_harness().await;

    // Never-written queue reads as empty at version 0
    let empty = h.engine.query(MESS).await.unwrap();
    assert_eq!(empty.phase, QueuePhase::Empty);
    assert_eq!(empty.version, 0);

    let alice = h.engine.join(MESS, "u-alice", "Alice").await.unwrap();
    let bob = h.engine.join(MESS, "u-bob", "").await.unwrap();
    assert_eq!(alice.token, 1);
    assert_eq!(bob.token, 2);
    assert_eq!(bob.display_name, "Anonymous");

    let snapshot = h.engine.query(MESS).await.unwrap();
    assert_eq!(snapshot.current_token, 0);
    assert_eq!(snapshot.total_tokens_issued, 2);
    assert_eq!(snapshot.total_in_queue, 2);
    assert_eq!(snapshot.upcoming_tokens(5), vec![1, 2]);

    let position = h.engine.position(MESS, "u-bob").await.unwrap().unwrap();
    assert_eq!(position.people_ahead, 1);
    assert_eq!(position.estimated_wait_minutes, 2);
    assert!(!position.is_my_turn);

    assert_eq!(h.engine.advance(MESS).await.unwrap(), 1);
    assert_eq!(h.engine.advance(MESS).await.unwrap(), 2);
    // Caught up: advance is a no-op
    assert_eq!(h.engine.advance(MESS).await.unwrap(), 2);

    let done = h.engine.query(MESS).await.unwrap();
    assert_eq!(done.phase, QueuePhase::CaughtUp);
    assert_eq!(done.total_in_queue, 0);
    assert!(h.engine.position(MESS, "u-bob").await.unwrap().unwrap().is_my_turn);
}

/// Leaving and rejoining issues a larger token
#[tokio::test]
async fn test_leave_and_rejoin() {
    let h = memory_harness().await;

    h.engine.join(MESS, "u1", "A").await.unwrap();
    h.engine.join(MESS, "u2", "B").await.unwrap();

    assert!(h.engine.leave(MESS, "u1").await.unwrap());
    assert!(!h.engine.leave(MESS, "u1").await.unwrap());

    let rejoined = h.engine.join(MESS, "u1", "A").await.unwrap();
    assert_eq!(rejoined.token, 3);

    let snapshot = h.engine.query(MESS).await.unwrap();
    let tokens: Vec<u64> = snapshot.waiting_members.iter().map(|m| m.token).collect();
    assert_eq!(tokens, vec![2, 3]);
}

/// Repeat join hands back the same token
#[tokio::test]
async fn test_repeat_join_is_idempotent() {
    let h = memory_harness().await;

    let first = h.engine.join(MESS, "u1", "A").await.unwrap();
    let version = h.engine.query(MESS).await.unwrap().version;
    let again = h.engine.join(MESS, "u1", "Renamed").await.unwrap();

    assert_eq!(first, again);
    assert_eq!(h.engine.query(MESS).await.unwrap().version, version);
}

/// Closed queues and appointment services refuse joins without touching storage
#[tokio::test]
async fn test_join_refused_for_closed_and_appointment_services() {
    let h = memory_harness().await;

    let closed = h.engine.join("main-gym", "u1", "A").await.unwrap_err();
    assert!(matches!(closed, AppError::ServiceUnavailable { .. }));

    let appointment = h.engine.join("hod-cse", "u1", "A").await.unwrap_err();
    assert!(matches!(appointment, AppError::ServiceUnavailable { .. }));

    let missing = h.engine.join("no-such-service", "u1", "A").await.unwrap_err();
    assert!(matches!(missing, AppError::ServiceNotFound(_)));

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM queues")
        .fetch_one(&h.pool)
        .await
        .unwrap();
    assert_eq!(rows, 0);
}

/// Closing a service stops joins but staff can still serve the backlog
#[tokio::test]
async fn test_closing_a_service_mid_day() {
    let h = memory_harness().await;

    h.engine.join(MESS, "u1", "A").await.unwrap();
    h.directory
        .set_status(MESS, ServiceStatus::Closed)
        .await
        .unwrap();

    assert!(matches!(
        h.engine.join(MESS, "u2", "B").await.unwrap_err(),
        AppError::ServiceUnavailable { .. }
    ));
    assert_eq!(h.engine.advance(MESS).await.unwrap(), 1);
    assert!(h.engine.leave(MESS, "u1").await.unwrap());
}

/// Active tokens span every queue service
#[tokio::test]
async fn test_active_tokens_across_services() {
    let h = memory_harness().await;

    h.engine.join(MESS, "u1", "A").await.unwrap();
    h.engine.join("out-pass-gate-1", "u0", "Z").await.unwrap();
    h.engine.join("out-pass-gate-1", "u1", "A").await.unwrap();

    let mut tokens = h.engine.active_tokens("u1").await.unwrap();
    tokens.sort_by(|a, b| a.service_id.cmp(&b.service_id));

    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].service_id, MESS);
    assert_eq!(tokens[0].token, 1);
    assert_eq!(tokens[1].service_id, "out-pass-gate-1");
    assert_eq!(tokens[1].token, 2);
    assert_eq!(tokens[1].service_name, "Out-Pass Gate 1");
    assert_eq!(tokens[1].icon_name, "Ticket");
}

/// Staff removal and pruning of served entries
#[tokio::test]
async fn test_remove_and_prune() {
    let h = memory_harness().await;

    for (id, name) in [("u1", "A"), ("u2", "B"), ("u3", "C")] {
        h.engine.join(MESS, id, name).await.unwrap();
    }

    let removed = h.engine.admin_remove(MESS, "u2").await.unwrap().unwrap();
    assert_eq!(removed.token, 2);

    h.engine.advance(MESS).await.unwrap();
    assert_eq!(h.engine.prune_all().await.unwrap(), 1);

    let snapshot = h.engine.query(MESS).await.unwrap();
    assert_eq!(snapshot.total_tokens_issued, 3);
    assert_eq!(snapshot.waiting_members.len(), 1);
    assert_eq!(snapshot.waiting_members[0].token, 3);
}

/// Every successful write is announced once, keyed by service
#[tokio::test]
async fn test_writes_are_announced() {
    let h = memory_harness().await;
    let mut subscription = h.notifier.subscribe(SubscriptionFilter::service(MESS));

    h.engine.join(MESS, "u1", "A").await.unwrap();
    // Idempotent join writes nothing
    h.engine.join(MESS, "u1", "A").await.unwrap();
    h.engine.advance(MESS).await.unwrap();

    for _ in 0..2 {
        match subscription.recv().await.unwrap() {
            Notification::Changed(event) => assert_eq!(event.key(), "queue_mens-mess-1"),
            other => panic!("unexpected {:?}", other),
        }
    }

    let nothing = tokio::time::timeout(
        std::time::Duration::from_millis(50),
        subscription.recv(),
    )
    .await;
    assert!(nothing.is_err(), "no third event expected");
}
