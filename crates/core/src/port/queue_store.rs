// Queue Store Port (Interface)

use crate::domain::QueueState;
use crate::error::Result;
use crate::port::maintenance::{Maintenance, MaintenanceStats};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Queue state plus the version it was read at
///
/// Version 0 means the queue has never been written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionedQueue {
    pub state: QueueState,
    pub version: i64,
}

/// Durable per-service queue storage with compare-and-swap writes
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Load the queue for `service_id`, or the empty default at version 0
    async fn load(&self, service_id: &str) -> Result<VersionedQueue>;

    /// Persist `state` only if the stored version still equals `expected_version`
    ///
    /// Returns `Ok(false)` when another writer got there first. On success the
    /// stored version becomes `expected_version + 1`.
    async fn compare_and_swap(
        &self,
        service_id: &str,
        expected_version: i64,
        state: &QueueState,
    ) -> Result<bool>;

    /// Ids of every queue that has been written at least once
    async fn list_queue_ids(&self) -> Result<Vec<String>>;
}

/// In-process queue store (tests and the `memory` backend)
#[derive(Default)]
pub struct InMemoryQueueStore {
    inner: Mutex<HashMap<String, VersionedQueue>>,
}

impl InMemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, VersionedQueue>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl QueueStore for InMemoryQueueStore {
    async fn load(&self, service_id: &str) -> Result<VersionedQueue> {
        Ok(self.entries().get(service_id).cloned().unwrap_or_default())
    }

    async fn compare_and_swap(
        &self,
        service_id: &str,
        expected_version: i64,
        state: &QueueState,
    ) -> Result<bool> {
        let mut entries = self.entries();
        let current = entries.get(service_id).map(|q| q.version).unwrap_or(0);

        if current != expected_version {
            return Ok(false);
        }

        entries.insert(
            service_id.to_string(),
            VersionedQueue {
                state: state.clone(),
                version: expected_version + 1,
            },
        );
        Ok(true)
    }

    async fn list_queue_ids(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.entries().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

#[async_trait]
impl Maintenance for InMemoryQueueStore {
    async fn vacuum(&self) -> Result<i64> {
        Ok(0)
    }

    async fn get_stats(&self) -> Result<MaintenanceStats> {
        Ok(MaintenanceStats {
            queue_count: self.entries().len() as i64,
            ..MaintenanceStats::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_missing_is_default() {
        let store = InMemoryQueueStore::new();
        let loaded = store.load("nope").await.unwrap();

        assert_eq!(loaded.version, 0);
        assert_eq!(loaded.state, QueueState::default());
    }

    #[tokio::test]
    async fn test_stale_write_is_rejected() {
        let store = InMemoryQueueStore::new();
        let mut state = QueueState::default();
        state.issue("u1", "Alice").unwrap();

        assert!(store.compare_and_swap("q", 0, &state).await.unwrap());
        // Second writer still holding version 0 loses
        assert!(!store.compare_and_swap("q", 0, &state).await.unwrap());

        let loaded = store.load("q").await.unwrap();
        assert_eq!(loaded.version, 1);
        assert_eq!(store.list_queue_ids().await.unwrap(), vec!["q".to_string()]);
    }
}
