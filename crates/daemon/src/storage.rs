//! Backend selection
//!
//! Builds the store, catalog and maintenance adapters for the configured
//! backend and seeds the catalog when asked to.

use crate::config::{DaemonConfig, StorageBackend};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokenline_core::application::catalog::default_catalog;
use tokenline_core::port::time_provider::SystemTimeProvider;
use tokenline_core::port::{
    InMemoryQueueStore, InMemoryServiceDirectory, Maintenance, QueueStore, ServiceDirectory,
};
use tokenline_infra_sqlite::{
    create_pool, run_migrations, SqliteMaintenance, SqliteQueueStore, SqliteServiceDirectory,
};
use tracing::info;

pub struct Storage {
    pub store: Arc<dyn QueueStore>,
    pub directory: Arc<dyn ServiceDirectory>,
    pub maintenance: Arc<dyn Maintenance>,
}

pub async fn open(config: &DaemonConfig) -> Result<Storage> {
    match config.storage {
        StorageBackend::Sqlite => open_sqlite(&config.db_path, config.seed_catalog).await,
        StorageBackend::Memory => {
            info!("Using in-memory storage (state is lost on exit)");
            let store = Arc::new(InMemoryQueueStore::new());
            let services = if config.seed_catalog {
                default_catalog()
            } else {
                Vec::new()
            };

            Ok(Storage {
                store: store.clone(),
                directory: Arc::new(InMemoryServiceDirectory::new(services)),
                maintenance: store,
            })
        }
    }
}

async fn open_sqlite(db_path: &str, seed_catalog: bool) -> Result<Storage> {
    info!(db_path = %db_path, "Initializing database...");

    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let pool = create_pool(db_path)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    let directory = Arc::new(SqliteServiceDirectory::new(pool.clone()));
    if seed_catalog {
        let seeded = directory.seed_if_empty(&default_catalog()).await?;
        if seeded == 0 {
            info!("Service catalog already populated");
        }
    }

    Ok(Storage {
        store: Arc::new(SqliteQueueStore::new(
            pool.clone(),
            Arc::new(SystemTimeProvider),
        )),
        directory,
        maintenance: Arc::new(SqliteMaintenance::new(pool)),
    })
}
