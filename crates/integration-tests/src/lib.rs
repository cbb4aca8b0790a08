//! Shared fixtures for the integration tests
//!
//! Wires the core engine to the SQLite adapters the same way the daemon does.

use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokenline_core::application::catalog::default_catalog;
use tokenline_core::application::{BroadcastNotifier, EngineConfig, QueueEngine};
use tokenline_core::port::id_provider::UuidProvider;
use tokenline_core::port::time_provider::SystemTimeProvider;
use tokenline_infra_sqlite::{
    create_pool, run_migrations, SqliteQueueStore, SqliteServiceDirectory,
};

/// Engine plus the pieces tests poke at directly
pub struct Harness {
    pub pool: SqlitePool,
    pub engine: Arc<QueueEngine>,
    pub notifier: Arc<BroadcastNotifier>,
    pub directory: Arc<SqliteServiceDirectory>,
}

/// Open `url`, migrate, seed the catalog, build an engine
pub async fn harness(url: &str, config: EngineConfig) -> Harness {
    let pool = create_pool(url).await.unwrap();
    run_migrations(&pool).await.unwrap();

    let directory = Arc::new(SqliteServiceDirectory::new(pool.clone()));
    directory.seed_if_empty(&default_catalog()).await.unwrap();

    let notifier = Arc::new(BroadcastNotifier::default());
    let engine = Arc::new(QueueEngine::new(
        Arc::new(SqliteQueueStore::new(pool.clone(), Arc::new(SystemTimeProvider))),
        directory.clone(),
        notifier.clone(),
        &UuidProvider,
        config,
    ));

    Harness {
        pool,
        engine,
        notifier,
        directory,
    }
}

/// In-memory database
pub async fn memory_harness() -> Harness {
    harness("sqlite::memory:", EngineConfig::default()).await
}

/// Unique database file under the temp dir, removed (with WAL files) on drop
pub struct TempDb {
    path: PathBuf,
}

impl TempDb {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("tokenline-it-{}.db", uuid::Uuid::new_v4()));
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn url(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

impl Default for TempDb {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut name = self.path.clone().into_os_string();
            name.push(suffix);
            let _ = std::fs::remove_file(name);
        }
    }
}
