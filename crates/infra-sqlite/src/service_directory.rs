// SQLite ServiceDirectory Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use sqlx::SqlitePool;
use tokenline_core::domain::{Gender, Service, ServiceStatus, ServiceType};
use tokenline_core::error::{AppError, Result};
use tokenline_core::port::ServiceDirectory;
use tracing::info;

/// Service catalog backed by the `services` table
pub struct SqliteServiceDirectory {
    pool: SqlitePool,
}

impl SqliteServiceDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace a service
    pub async fn upsert_service(&self, service: &Service) -> Result<()> {
        sqlx::query(UPSERT_SQL)
            .bind(&service.id)
            .bind(&service.name)
            .bind(service.service_type.to_string())
            .bind(service.status.to_string())
            .bind(&service.icon_name)
            .bind(&service.description)
            .bind(service.gender.map(|g| g.to_string()))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    /// Open or close a service. Returns false if the service does not exist.
    pub async fn set_status(&self, service_id: &str, status: ServiceStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE services SET status = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(service_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() == 1)
    }

    /// Load `services` into an empty catalog
    ///
    /// Returns the number of services inserted (0 if the catalog already had rows).
    pub async fn seed_if_empty(&self, services: &[Service]) -> Result<usize> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM services")
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        if existing > 0 {
            return Ok(0);
        }

        for service in services {
            sqlx::query(UPSERT_SQL)
                .bind(&service.id)
                .bind(&service.name)
                .bind(service.service_type.to_string())
                .bind(service.status.to_string())
                .bind(&service.icon_name)
                .bind(&service.description)
                .bind(service.gender.map(|g| g.to_string()))
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;

        info!(count = services.len(), "Seeded service catalog");
        Ok(services.len())
    }
}

const UPSERT_SQL: &str = r#"
    INSERT INTO services (id, name, service_type, status, icon_name, description, gender)
    VALUES (?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(id) DO UPDATE SET
        name = excluded.name,
        service_type = excluded.service_type,
        status = excluded.status,
        icon_name = excluded.icon_name,
        description = excluded.description,
        gender = excluded.gender
"#;

#[derive(Debug, sqlx::FromRow)]
struct ServiceRow {
    id: String,
    name: String,
    service_type: String,
    status: String,
    icon_name: String,
    description: String,
    gender: Option<String>,
}

impl ServiceRow {
    fn into_service(self) -> Result<Service> {
        let service_type: ServiceType = self.service_type.parse().map_err(AppError::Internal)?;
        let status: ServiceStatus = self.status.parse().map_err(AppError::Internal)?;
        let gender = self
            .gender
            .map(|g| g.parse::<Gender>())
            .transpose()
            .map_err(AppError::Internal)?;

        Ok(Service {
            id: self.id,
            name: self.name,
            service_type,
            status,
            icon_name: self.icon_name,
            description: self.description,
            gender,
        })
    }
}

#[async_trait]
impl ServiceDirectory for SqliteServiceDirectory {
    async fn get_service(&self, service_id: &str) -> Result<Option<Service>> {
        let row = sqlx::query_as::<_, ServiceRow>(
            r#"
            SELECT id, name, service_type, status, icon_name, description, gender
            FROM services
            WHERE id = ?
            "#,
        )
        .bind(service_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(ServiceRow::into_service).transpose()
    }

    async fn list_services(&self) -> Result<Vec<Service>> {
        let rows = sqlx::query_as::<_, ServiceRow>(
            r#"
            SELECT id, name, service_type, status, icon_name, description, gender
            FROM services
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(ServiceRow::into_service).collect()
    }
}
