// Prune Scheduler
// Periodically drops already-served members from every queue

mod shutdown;

pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::application::QueueEngine;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info};

/// Prune scheduler
///
/// Runs `QueueEngine::prune_all` in the background until shutdown
pub struct PruneScheduler {
    engine: Arc<QueueEngine>,
    every: Duration,
}

impl PruneScheduler {
    /// Create a new prune scheduler
    ///
    /// # Arguments
    /// * `engine` - Engine whose queues get pruned
    /// * `every` - Interval between runs
    pub fn new(engine: Arc<QueueEngine>, every: Duration) -> Self {
        Self { engine, every }
    }

    /// Run prune loop (background task)
    ///
    /// Should be spawned in tokio::spawn
    pub async fn run(self, mut shutdown: ShutdownToken) {
        info!(interval_secs = self.every.as_secs(), "Prune scheduler started");

        let mut tick = interval(self.every);
        // The first tick completes immediately; skip it so startup isn't a prune
        tick.tick().await;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if let Err(e) = self.run_now().await {
                        error!(error = ?e, "Scheduled prune failed");
                    }
                }
                _ = shutdown.wait() => {
                    info!("Prune scheduler stopping");
                    return;
                }
            }
        }
    }

    /// Prune immediately (for manual trigger)
    pub async fn run_now(&self) -> Result<usize> {
        let pruned = self.engine.prune_all().await?;
        info!(pruned, "Prune completed");
        Ok(pruned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{BroadcastNotifier, EngineConfig};
    use crate::application::catalog::default_catalog;
    use crate::port::id_provider::FixedIdProvider;
    use crate::port::{InMemoryQueueStore, InMemoryServiceDirectory};

    fn engine() -> Arc<QueueEngine> {
        Arc::new(QueueEngine::new(
            Arc::new(InMemoryQueueStore::new()),
            Arc::new(InMemoryServiceDirectory::new(default_catalog())),
            Arc::new(BroadcastNotifier::default()),
            &FixedIdProvider("prune-test".to_string()),
            EngineConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_run_now_prunes_served_members() {
        let engine = engine();
        engine.join("mens-mess-1", "u1", "Alice").await.unwrap();
        engine.join("mens-mess-1", "u2", "Bob").await.unwrap();
        engine.advance("mens-mess-1").await.unwrap();

        let scheduler = PruneScheduler::new(engine.clone(), Duration::from_secs(3600));
        assert_eq!(scheduler.run_now().await.unwrap(), 1);
        assert_eq!(scheduler.run_now().await.unwrap(), 0);

        let snapshot = engine.query("mens-mess-1").await.unwrap();
        assert_eq!(snapshot.total_in_queue, 1);
        assert_eq!(snapshot.total_tokens_issued, 2);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let scheduler = PruneScheduler::new(engine(), Duration::from_millis(10));
        let (tx, token) = shutdown_channel();

        let handle = tokio::spawn(scheduler.run(token));
        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.shutdown();

        let result = tokio::time::timeout(Duration::from_secs(2), handle).await;
        assert!(result.is_ok(), "scheduler should stop after shutdown");
    }
}
