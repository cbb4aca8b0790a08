// SQLite QueueStore Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokenline_core::domain::QueueState;
use tokenline_core::error::{AppError, Result};
use tokenline_core::port::{QueueStore, TimeProvider, VersionedQueue};
use tracing::{debug, warn};

/// One JSON record per service in the `queues` table
pub struct SqliteQueueStore {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteQueueStore {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct QueueRow {
    service_id: String,
    state: String,
    version: i64,
}

impl QueueRow {
    fn into_versioned(self) -> Result<VersionedQueue> {
        let state: QueueState =
            serde_json::from_str(&self.state).map_err(|e| AppError::CorruptState {
                service_id: self.service_id.clone(),
                reason: format!("unreadable record: {}", e),
            })?;

        state.validate().map_err(|e| AppError::CorruptState {
            service_id: self.service_id.clone(),
            reason: e.to_string(),
        })?;

        Ok(VersionedQueue {
            state,
            version: self.version,
        })
    }
}

#[async_trait]
impl QueueStore for SqliteQueueStore {
    async fn load(&self, service_id: &str) -> Result<VersionedQueue> {
        let row = sqlx::query_as::<_, QueueRow>(
            "SELECT service_id, state, version FROM queues WHERE service_id = ?",
        )
        .bind(service_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some(row) => row.into_versioned().inspect_err(|e| {
                warn!(service_id = %service_id, error = %e, "Rejected stored queue record");
            }),
            None => Ok(VersionedQueue::default()),
        }
    }

    async fn compare_and_swap(
        &self,
        service_id: &str,
        expected_version: i64,
        state: &QueueState,
    ) -> Result<bool> {
        // Never persist a record we would refuse to load
        state.validate()?;

        let json = serde_json::to_string(state)?;
        let now = self.time_provider.now_millis();

        let result = if expected_version == 0 {
            sqlx::query(
                r#"
                INSERT INTO queues (service_id, state, version, updated_at)
                VALUES (?, ?, 1, ?)
                ON CONFLICT(service_id) DO NOTHING
                "#,
            )
            .bind(service_id)
            .bind(&json)
            .bind(now)
            .execute(&self.pool)
            .await
        } else {
            sqlx::query(
                r#"
                UPDATE queues
                SET state = ?, version = version + 1, updated_at = ?
                WHERE service_id = ? AND version = ?
                "#,
            )
            .bind(&json)
            .bind(now)
            .bind(service_id)
            .bind(expected_version)
            .execute(&self.pool)
            .await
        }
        .map_err(map_sqlx_error)?;

        let swapped = result.rows_affected() == 1;
        if !swapped {
            debug!(
                service_id = %service_id,
                expected_version = expected_version,
                "Stale queue write rejected"
            );
        }

        Ok(swapped)
    }

    async fn list_queue_ids(&self) -> Result<Vec<String>> {
        sqlx::query_scalar("SELECT service_id FROM queues ORDER BY service_id")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }
}
