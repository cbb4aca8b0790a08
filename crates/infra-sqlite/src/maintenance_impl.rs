// SQLite Maintenance Implementation
use crate::error::map_sqlx_error;
use async_trait::async_trait;
use sqlx::SqlitePool;
use tokenline_core::error::{AppError, Result};
use tokenline_core::port::{Maintenance, MaintenanceStats};
use tracing::info;

/// SQLite maintenance implementation
pub struct SqliteMaintenance {
    pool: SqlitePool,
}

impl SqliteMaintenance {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn pragma(&self, name: &str) -> Result<i64> {
        let sql = format!("PRAGMA {}", name);
        let value: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read {}: {}", name, e)))?;
        Ok(value)
    }

    /// Get DB file size in bytes
    async fn get_db_size(&self) -> Result<i64> {
        let page_count = self.pragma("page_count").await?;
        let page_size = self.pragma("page_size").await?;
        Ok(page_count * page_size)
    }
}

#[async_trait]
impl Maintenance for SqliteMaintenance {
    async fn vacuum(&self) -> Result<i64> {
        info!("Running VACUUM to optimize database...");

        let size_before = self.get_db_size().await?;

        // Run VACUUM (reclaims space and defragments)
        sqlx::query("VACUUM")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("VACUUM failed: {}", e)))?;

        let size_after = self.get_db_size().await?;
        let reclaimed = (size_before - size_after).max(0);

        info!(
            size_before_bytes = size_before,
            size_after_bytes = size_after,
            reclaimed_bytes = reclaimed,
            "VACUUM completed"
        );

        Ok(reclaimed)
    }

    async fn get_stats(&self) -> Result<MaintenanceStats> {
        let page_count = self.pragma("page_count").await?;
        let page_size = self.pragma("page_size").await?;
        let freelist_count = self.pragma("freelist_count").await?;

        let queue_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM queues")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let service_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM services")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let fragmentation_percent = if page_count > 0 {
            freelist_count as f64 / page_count as f64 * 100.0
        } else {
            0.0
        };

        Ok(MaintenanceStats {
            db_size_bytes: page_count * page_size,
            queue_count,
            service_count,
            fragmentation_percent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};

    async fn setup() -> (SqlitePool, SqliteMaintenance) {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let maintenance = SqliteMaintenance::new(pool.clone());
        (pool, maintenance)
    }

    #[tokio::test]
    async fn test_maintenance_stats() {
        let (pool, maintenance) = setup().await;
        sqlx::query(
            r#"INSERT INTO queues (service_id, state, version, updated_at)
               VALUES ('q1', '{"currentToken":0,"totalTokensIssued":0,"members":[]}', 1, 0)"#,
        )
        .execute(&pool)
        .await
        .unwrap();

        let stats = maintenance.get_stats().await.unwrap();

        assert!(stats.db_size_bytes > 0);
        assert_eq!(stats.queue_count, 1);
        assert_eq!(stats.service_count, 0);
        assert!(stats.fragmentation_percent >= 0.0);
    }

    #[tokio::test]
    async fn test_vacuum() {
        let (_pool, maintenance) = setup().await;

        let reclaimed = maintenance.vacuum().await.unwrap();
        assert!(reclaimed >= 0);
    }
}
