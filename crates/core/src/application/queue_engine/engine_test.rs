//! Unit tests for the queue engine (in-memory adapters)

use super::*;
use crate::application::catalog::default_catalog;
use crate::application::{BroadcastNotifier, Notification, SubscriptionFilter};
use crate::domain::{QueuePhase, Service, ServiceStatus, ServiceType};
use crate::port::id_provider::FixedIdProvider;
use crate::port::{InMemoryQueueStore, InMemoryServiceDirectory, VersionedQueue};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

fn directory() -> Arc<InMemoryServiceDirectory> {
    let directory = InMemoryServiceDirectory::new(default_catalog());
    directory.upsert(Service::new("Q1", "Queue One", ServiceType::Queue, ServiceStatus::Open));
    directory.upsert(Service::new("Q2", "Queue Two", ServiceType::Queue, ServiceStatus::Closed));
    Arc::new(directory)
}

struct Harness {
    engine: QueueEngine,
    bus: Arc<BroadcastNotifier>,
}

fn harness_with(store: Arc<dyn QueueStore>, config: EngineConfig) -> Harness {
    let bus = Arc::new(BroadcastNotifier::default());
    let engine = QueueEngine::new(
        store,
        directory(),
        bus.clone(),
        &FixedIdProvider("engine-under-test".to_string()),
        config,
    );
    Harness { engine, bus }
}

fn harness() -> Harness {
    harness_with(Arc::new(InMemoryQueueStore::new()), EngineConfig::default())
}

#[tokio::test]
async fn test_scenario_walkthrough() {
    let h = harness();
    let engine = &h.engine;

    // 1. Two joins on an empty open queue
    assert_eq!(engine.join("Q1", "u1", "Alice").await.unwrap().token, 1);
    assert_eq!(engine.join("Q1", "u2", "Bob").await.unwrap().token, 2);

    let snapshot = engine.query("Q1").await.unwrap();
    assert_eq!(snapshot.current_token, 0);
    assert_eq!(snapshot.total_in_queue, 2);
    let waiting: Vec<(&str, u64)> = snapshot
        .waiting_members
        .iter()
        .map(|m| (m.member_id.as_str(), m.token))
        .collect();
    assert_eq!(waiting, vec![("u1", 1), ("u2", 2)]);

    // 2. Serve Alice
    assert_eq!(engine.advance("Q1").await.unwrap(), 1);
    let snapshot = engine.query("Q1").await.unwrap();
    assert_eq!(snapshot.total_in_queue, 1);
    assert_eq!(snapshot.waiting_members[0].member_id, "u2");

    // 3. Admin removes Bob, counter stays
    let removed = engine.admin_remove("Q1", "u2").await.unwrap().unwrap();
    assert_eq!(removed.display_name, "Bob");
    let snapshot = engine.query("Q1").await.unwrap();
    assert_eq!(snapshot.total_in_queue, 0);
    assert!(snapshot.waiting_members.is_empty());
    assert_eq!(snapshot.total_tokens_issued, 2);

    // 4. Carol gets a fresh token, Bob's is never reused
    assert_eq!(engine.join("Q1", "u3", "Carol").await.unwrap().token, 3);

    // 5. Closed queue rejects joins and stays empty
    let err = engine.join("Q2", "u1", "Alice").await.unwrap_err();
    assert!(matches!(err, AppError::ServiceUnavailable { .. }));
    let snapshot = engine.query("Q2").await.unwrap();
    assert_eq!(snapshot.current_token, 0);
    assert_eq!(snapshot.total_in_queue, 0);
    assert_eq!(snapshot.total_tokens_issued, 0);
}

#[tokio::test]
async fn test_tokens_are_one_to_n_in_call_order() {
    let h = harness();

    for i in 1..=25u64 {
        let member = h
            .engine
            .join("Q1", &format!("member-{}", i), "Student")
            .await
            .unwrap();
        assert_eq!(member.token, i);
    }

    let snapshot = h.engine.query("Q1").await.unwrap();
    assert_eq!(snapshot.total_tokens_issued, 25);
    assert_eq!(snapshot.phase, QueuePhase::Serving);
}

#[tokio::test]
async fn test_duplicate_join_returns_existing_token() {
    let h = harness();

    let first = h.engine.join("Q1", "u1", "Alice").await.unwrap();
    let second = h.engine.join("Q1", "u1", "Alice (tab 2)").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(h.engine.query("Q1").await.unwrap().total_tokens_issued, 1);
}

#[tokio::test]
async fn test_duplicate_join_rejected_under_reject_policy() {
    let config = EngineConfig {
        duplicate_join: DuplicateJoinPolicy::Reject,
        ..EngineConfig::default()
    };
    let h = harness_with(Arc::new(InMemoryQueueStore::new()), config);
    assert_eq!(h.engine.config().duplicate_join, DuplicateJoinPolicy::Reject);

    h.engine.join("Q1", "u1", "Alice").await.unwrap();
    let err = h.engine.join("Q1", "u1", "Alice").await.unwrap_err();

    match err {
        AppError::AlreadyInQueue { token, .. } => assert_eq!(token, 1),
        other => panic!("expected AlreadyInQueue, got {:?}", other),
    }
    assert_eq!(h.engine.query("Q1").await.unwrap().total_tokens_issued, 1);
}

#[tokio::test]
async fn test_served_member_can_rejoin() {
    let config = EngineConfig {
        duplicate_join: DuplicateJoinPolicy::Reject,
        ..EngineConfig::default()
    };
    let h = harness_with(Arc::new(InMemoryQueueStore::new()), config);

    h.engine.join("Q1", "u1", "Alice").await.unwrap();
    h.engine.advance("Q1").await.unwrap();

    // Served entries don't count as duplicates
    let again = h.engine.join("Q1", "u1", "Alice").await.unwrap();
    assert_eq!(again.token, 2);

    let snapshot = h.engine.query("Q1").await.unwrap();
    assert_eq!(snapshot.waiting_members.len(), 1);
}

#[tokio::test]
async fn test_leave_then_rejoin_gets_larger_token() {
    let h = harness();

    let before = h.engine.join("Q1", "u1", "Alice").await.unwrap();
    h.engine.join("Q1", "u2", "Bob").await.unwrap();
    assert!(h.engine.leave("Q1", "u1").await.unwrap());

    let after = h.engine.join("Q1", "u1", "Alice").await.unwrap();
    assert!(after.token > before.token);
    assert_eq!(after.token, 3);
}

#[tokio::test]
async fn test_leave_absent_member_is_noop() {
    let h = harness();
    h.engine.join("Q1", "u1", "Alice").await.unwrap();
    let version = h.engine.query("Q1").await.unwrap().version;

    assert!(!h.engine.leave("Q1", "ghost").await.unwrap());
    assert!(h.engine.admin_remove("Q1", "ghost").await.unwrap().is_none());
    assert_eq!(h.engine.query("Q1").await.unwrap().version, version);
}

#[tokio::test]
async fn test_leave_works_on_served_member_and_keeps_counters() {
    let h = harness();
    h.engine.join("Q1", "u1", "Alice").await.unwrap();
    h.engine.advance("Q1").await.unwrap();

    assert!(h.engine.leave("Q1", "u1").await.unwrap());

    let snapshot = h.engine.query("Q1").await.unwrap();
    assert_eq!(snapshot.current_token, 1);
    assert_eq!(snapshot.total_tokens_issued, 1);
}

#[tokio::test]
async fn test_advance_bounds() {
    let h = harness();

    // Empty queue: nothing to serve
    assert_eq!(h.engine.advance("Q1").await.unwrap(), 0);
    assert_eq!(h.engine.query("Q1").await.unwrap().version, 0);

    h.engine.join("Q1", "u1", "Alice").await.unwrap();
    h.engine.join("Q1", "u2", "Bob").await.unwrap();

    let mut last = 0;
    for _ in 0..5 {
        let current = h.engine.advance("Q1").await.unwrap();
        assert!(current >= last);
        assert!(current <= 2);
        last = current;
    }
    assert_eq!(last, 2);
    assert_eq!(h.engine.query("Q1").await.unwrap().phase, QueuePhase::CaughtUp);
}

#[tokio::test]
async fn test_advance_skips_departed_member() {
    let h = harness();
    h.engine.join("Q1", "u1", "Alice").await.unwrap();
    h.engine.join("Q1", "u2", "Bob").await.unwrap();
    h.engine.leave("Q1", "u1").await.unwrap();

    // Token 1 is still "served" even though Alice is gone
    assert_eq!(h.engine.advance("Q1").await.unwrap(), 1);
    let snapshot = h.engine.query("Q1").await.unwrap();
    assert_eq!(snapshot.waiting_members[0].token, 2);
}

#[tokio::test]
async fn test_advance_works_on_closed_queue() {
    let store = Arc::new(InMemoryQueueStore::new());
    let mut state = QueueState::default();
    state.issue("u1", "Alice").unwrap();
    store.compare_and_swap("Q2", 0, &state).await.unwrap();

    let h = harness_with(store, EngineConfig::default());
    assert_eq!(h.engine.advance("Q2").await.unwrap(), 1);
    assert!(h.engine.leave("Q2", "u1").await.unwrap());
}

#[tokio::test]
async fn test_join_on_exhausted_counter_is_refused() {
    let store = Arc::new(InMemoryQueueStore::new());
    let state = QueueState {
        current_token: u64::MAX,
        total_tokens_issued: u64::MAX,
        members: vec![],
    };
    store.compare_and_swap("Q1", 0, &state).await.unwrap();

    let h = harness_with(store.clone(), EngineConfig::default());
    let mut sub = h.bus.subscribe(SubscriptionFilter::all());

    let err = h.engine.join("Q1", "u1", "Alice").await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Domain(crate::domain::DomainError::TokensExhausted(u64::MAX))
    ));

    // Stored record untouched and nobody told about a change
    let stored = store.load("Q1").await.unwrap();
    assert_eq!(stored.version, 1);
    assert_eq!(stored.state, state);
    assert!(tokio::time::timeout(Duration::from_millis(20), sub.recv())
        .await
        .is_err());

    // Reads still work on the saturated record
    assert_eq!(h.engine.advance("Q1").await.unwrap(), u64::MAX);
    assert!(h.engine.position("Q1", "u1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_join_unknown_and_non_queue_services() {
    let h = harness();

    let err = h.engine.join("no-such-service", "u1", "Alice").await.unwrap_err();
    assert!(matches!(err, AppError::ServiceNotFound(_)));

    let err = h.engine.join("hod-cse", "u1", "Alice").await.unwrap_err();
    match err {
        AppError::ServiceUnavailable { reason, .. } => assert!(reason.contains("appointment")),
        other => panic!("expected ServiceUnavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_join_validation() {
    let h = harness();

    assert!(matches!(
        h.engine.join("Q1", "", "Alice").await.unwrap_err(),
        AppError::Validation(_)
    ));
    assert!(matches!(
        h.engine.join("bad id!", "u1", "Alice").await.unwrap_err(),
        AppError::Validation(_)
    ));

    let member = h.engine.join("Q1", "u1", "   ").await.unwrap();
    assert_eq!(member.display_name, "Anonymous");
}

#[tokio::test]
async fn test_position_and_active_tokens() {
    let h = harness();
    h.engine.join("mens-mess-1", "u1", "Alice").await.unwrap();
    h.engine.join("mens-mess-1", "u2", "Bob").await.unwrap();
    h.engine.join("mens-mess-1", "u3", "Carol").await.unwrap();
    h.engine.join("out-pass-gate-1", "u3", "Carol").await.unwrap();

    let pos = h.engine.position("mens-mess-1", "u3").await.unwrap().unwrap();
    assert_eq!(pos.people_ahead, 2);
    assert_eq!(pos.estimated_wait_minutes, 4);
    assert!(!pos.is_my_turn);

    assert!(h.engine.position("mens-mess-1", "nobody").await.unwrap().is_none());

    let tokens = h.engine.active_tokens("u3").await.unwrap();
    let services: Vec<&str> = tokens.iter().map(|t| t.service_id.as_str()).collect();
    assert_eq!(services, vec!["mens-mess-1", "out-pass-gate-1"]);
    assert_eq!(tokens[0].token, 3);
    assert_eq!(tokens[0].total_in_queue, 3);
    assert_eq!(tokens[1].token, 1);
    assert_eq!(tokens[1].icon_name, "Ticket");
}

#[tokio::test]
async fn test_upcoming_tokens() {
    let h = harness();
    for i in 0..8 {
        h.engine.join("Q1", &format!("u{}", i), "S").await.unwrap();
    }
    h.engine.advance("Q1").await.unwrap();

    let snapshot = h.engine.query("Q1").await.unwrap();
    assert_eq!(snapshot.upcoming_tokens(5), vec![2, 3, 4, 5, 6]);
}

#[tokio::test]
async fn test_mutations_notify_and_noops_do_not() {
    let h = harness();
    let mut sub = h.bus.subscribe(SubscriptionFilter::service("Q1"));

    h.engine.join("Q1", "u1", "Alice").await.unwrap();
    match sub.recv().await {
        Some(Notification::Changed(event)) => {
            assert_eq!(event.key(), "queue_Q1");
            assert_eq!(event.origin, h.engine.origin());
        }
        other => panic!("unexpected notification: {:?}", other),
    }

    // Duplicate join, absent leave, advance past the end: no writes, no events
    h.engine.join("Q1", "u1", "Alice").await.unwrap();
    h.engine.leave("Q1", "ghost").await.unwrap();
    h.engine.advance("Q1").await.unwrap();
    h.engine.advance("Q1").await.unwrap();

    // Exactly one event for the single real advance
    assert!(matches!(sub.recv().await, Some(Notification::Changed(_))));
    let nothing = tokio::time::timeout(Duration::from_millis(50), sub.recv()).await;
    assert!(nothing.is_err());
}

#[tokio::test]
async fn test_own_origin_can_be_excluded() {
    let h = harness();
    let mut sub = h
        .bus
        .subscribe(SubscriptionFilter::all().excluding_origin(h.engine.origin()));

    h.engine.join("Q1", "u1", "Alice").await.unwrap();
    let nothing = tokio::time::timeout(Duration::from_millis(50), sub.recv()).await;
    assert!(nothing.is_err());
}

#[tokio::test]
async fn test_concurrent_joins_get_unique_tokens() {
    let h = Arc::new(harness());

    let mut handles = vec![];
    for i in 0..50 {
        let h = h.clone();
        handles.push(tokio::spawn(async move {
            h.engine
                .join("Q1", &format!("member-{}", i), "Student")
                .await
                .unwrap()
                .token
        }));
    }

    let mut tokens = vec![];
    for handle in handles {
        tokens.push(handle.await.unwrap());
    }
    tokens.sort();
    assert_eq!(tokens, (1..=50).collect::<Vec<u64>>());
}

/// Store where another writer sneaks in before our first write
struct RacingStore {
    inner: InMemoryQueueStore,
    raced: AtomicBool,
}

#[async_trait]
impl QueueStore for RacingStore {
    async fn load(&self, service_id: &str) -> Result<VersionedQueue> {
        self.inner.load(service_id).await
    }

    async fn compare_and_swap(
        &self,
        service_id: &str,
        expected_version: i64,
        state: &QueueState,
    ) -> Result<bool> {
        if !self.raced.swap(true, Ordering::SeqCst) {
            // Rival admin advances the same queue first
            let rival = self.inner.load(service_id).await?;
            let mut rival_state = rival.state;
            rival_state.advance();
            assert!(self
                .inner
                .compare_and_swap(service_id, rival.version, &rival_state)
                .await?);
        }
        self.inner
            .compare_and_swap(service_id, expected_version, state)
            .await
    }

    async fn list_queue_ids(&self) -> Result<Vec<String>> {
        self.inner.list_queue_ids().await
    }
}

#[tokio::test]
async fn test_racing_advance_does_not_lose_increment() {
    let inner = InMemoryQueueStore::new();
    let mut state = QueueState::default();
    state.issue("u1", "Alice").unwrap();
    state.issue("u2", "Bob").unwrap();
    state.issue("u3", "Carol").unwrap();
    inner.compare_and_swap("Q1", 0, &state).await.unwrap();

    let store = Arc::new(RacingStore {
        inner,
        raced: AtomicBool::new(false),
    });
    let h = harness_with(store.clone(), EngineConfig::default());

    // Rival moved 0 -> 1, our retry must land on 2 (not overwrite with 1)
    assert_eq!(h.engine.advance("Q1").await.unwrap(), 2);
    assert_eq!(store.load("Q1").await.unwrap().state.current_token, 2);
}

/// Store that always loses the race
struct ContendedStore {
    inner: InMemoryQueueStore,
    attempts: AtomicUsize,
}

#[async_trait]
impl QueueStore for ContendedStore {
    async fn load(&self, service_id: &str) -> Result<VersionedQueue> {
        self.inner.load(service_id).await
    }

    async fn compare_and_swap(
        &self,
        _service_id: &str,
        _expected_version: i64,
        _state: &QueueState,
    ) -> Result<bool> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Ok(false)
    }

    async fn list_queue_ids(&self) -> Result<Vec<String>> {
        self.inner.list_queue_ids().await
    }
}

#[tokio::test]
async fn test_conflict_after_retries_exhausted() {
    let store = Arc::new(ContendedStore {
        inner: InMemoryQueueStore::new(),
        attempts: AtomicUsize::new(0),
    });
    let config = EngineConfig {
        max_cas_retries: 3,
        ..EngineConfig::default()
    };
    let h = harness_with(store.clone(), config);

    let err = h.engine.join("Q1", "u1", "Alice").await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(store.attempts.load(Ordering::SeqCst), 4);
}

/// Store whose writes always fail
struct BrokenStore {
    inner: InMemoryQueueStore,
}

#[async_trait]
impl QueueStore for BrokenStore {
    async fn load(&self, service_id: &str) -> Result<VersionedQueue> {
        self.inner.load(service_id).await
    }

    async fn compare_and_swap(
        &self,
        _service_id: &str,
        _expected_version: i64,
        _state: &QueueState,
    ) -> Result<bool> {
        Err(AppError::StorageUnavailable("disk on fire".to_string()))
    }

    async fn list_queue_ids(&self) -> Result<Vec<String>> {
        self.inner.list_queue_ids().await
    }
}

#[tokio::test]
async fn test_storage_failure_propagates_without_side_effects() {
    let store = Arc::new(BrokenStore {
        inner: InMemoryQueueStore::new(),
    });
    let h = harness_with(store.clone(), EngineConfig::default());
    let mut sub = h.bus.subscribe(SubscriptionFilter::all());

    let err = h.engine.join("Q1", "u1", "Alice").await.unwrap_err();
    assert!(matches!(err, AppError::StorageUnavailable(_)));

    assert_eq!(store.load("Q1").await.unwrap().version, 0);
    let nothing = tokio::time::timeout(Duration::from_millis(50), sub.recv()).await;
    assert!(nothing.is_err(), "failed writes must not notify");
}
