//! SQL implementation of the legacy device list repository

use crate::error::DbError;
use crate::repositories::legacy_device::{LegacyDevice, LegacyDeviceRepository};
use crate::repository::Repository;
use crate::DbClient;
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, info};

fn legacy_device_from_row(row: &AnyRow) -> Result<LegacyDevice, DbError> {
    Ok(LegacyDevice {
        id: row.try_get("id")?,
        device_name: row.try_get("device_name")?,
        device_classroom: row.try_get("device_classroom")?,
        device_url: row.try_get("device_url")?,
    })
}

/// SQL implementation of the legacy device list repository
#[derive(Debug, Clone)]
pub struct SqlLegacyDeviceRepository {
    /// The database client
    db_client: DbClient,
}

impl SqlLegacyDeviceRepository {
    /// Create a new SQL legacy device repository
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

impl Repository<LegacyDevice, DbError> for SqlLegacyDeviceRepository {
    type Id = i64;

    async fn create(&self, device: LegacyDevice) -> Result<LegacyDevice, DbError> {
        debug!("Creating legacy device '{}'", device.device_name);

        let row = sqlx::query(
            r#"
            INSERT INTO device_list (device_name, device_classroom, device_url)
            VALUES ($1, $2, $3)
            RETURNING id, device_name, device_classroom, device_url
            "#,
        )
        .bind(&device.device_name)
        .bind(&device.device_classroom)
        .bind(&device.device_url)
        .fetch_one(self.db_client.pool())
        .await
        .map_err(|e| DbError::from_sqlx("Failed to create legacy device", e))?;

        legacy_device_from_row(&row)
    }

    async fn read(&self, id: i64) -> Result<Option<LegacyDevice>, DbError> {
        let row = sqlx::query(
            "SELECT id, device_name, device_classroom, device_url FROM device_list WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.db_client.pool())
        .await
        .map_err(|e| DbError::from_sqlx("Failed to read legacy device", e))?;

        row.as_ref().map(legacy_device_from_row).transpose()
    }

    async fn update(&self, device: LegacyDevice) -> Result<Option<LegacyDevice>, DbError> {
        debug!("Updating legacy device {}", device.id);

        let row = sqlx::query(
            r#"
            UPDATE device_list
            SET device_name = $1, device_classroom = $2, device_url = $3
            WHERE id = $4
            RETURNING id, device_name, device_classroom, device_url
            "#,
        )
        .bind(&device.device_name)
        .bind(&device.device_classroom)
        .bind(&device.device_url)
        .bind(device.id)
        .fetch_optional(self.db_client.pool())
        .await
        .map_err(|e| DbError::from_sqlx("Failed to update legacy device", e))?;

        row.as_ref().map(legacy_device_from_row).transpose()
    }

    async fn delete(&self, id: i64) -> Result<bool, DbError> {
        debug!("Deleting legacy device {}", id);

        let result = sqlx::query("DELETE FROM device_list WHERE id = $1")
            .bind(id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| DbError::from_sqlx("Failed to delete legacy device", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<LegacyDevice>, DbError> {
        let rows = sqlx::query(
            "SELECT id, device_name, device_classroom, device_url FROM device_list ORDER BY id",
        )
        .fetch_all(self.db_client.pool())
        .await
        .map_err(|e| DbError::from_sqlx("Failed to list legacy devices", e))?;

        rows.iter().map(legacy_device_from_row).collect()
    }
}

impl LegacyDeviceRepository for SqlLegacyDeviceRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing legacy device list schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS device_list (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                device_name TEXT NOT NULL,
                device_classroom TEXT NOT NULL,
                device_url TEXT NOT NULL
            )
        "#;

        self.db_client.execute(query).await?;

        info!("Legacy device list schema initialized successfully");
        Ok(())
    }

    async fn find_by_classroom_and_url(
        &self,
        classroom: &str,
        device_url: &str,
    ) -> Result<Option<LegacyDevice>, DbError> {
        let row = sqlx::query(
            r#"
            SELECT id, device_name, device_classroom, device_url
            FROM device_list
            WHERE device_classroom = $1 AND device_url = $2
            ORDER BY id
            "#,
        )
        .bind(classroom)
        .bind(device_url)
        .fetch_optional(self.db_client.pool())
        .await
        .map_err(|e| DbError::from_sqlx("Failed to find legacy device", e))?;

        row.as_ref().map(legacy_device_from_row).transpose()
    }
}
