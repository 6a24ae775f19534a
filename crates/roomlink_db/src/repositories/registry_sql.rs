//! SQL implementation of the registry repository
//!
//! Timestamps are stored as Unix milliseconds because `DateTime<Utc>` does not
//! round-trip through the `sqlx::Any` driver.

use crate::error::{is_unique_violation, DbError};
use crate::repositories::registry::{
    AssignmentListRow, AssignmentRecord, DeviceRecord, DisplayAssignmentRow, NewAssignment,
    NewRegistrationRequest, PendingRequestRow, RegistrationRequestRecord, RegistryRepository,
    ReplaceRequestOutcome, RoomRecord,
};
use crate::DbClient;
use chrono::{DateTime, Utc};
use sqlx::any::AnyRow;
use sqlx::{AnyConnection, Row};
use tracing::{debug, info};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS devices (
        id TEXT PRIMARY KEY NOT NULL,
        manufacturer TEXT,
        model TEXT,
        created_at BIGINT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS rooms (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS registration_requests (
        id TEXT PRIMARY KEY NOT NULL,
        device_id TEXT NOT NULL REFERENCES devices(id) ON DELETE CASCADE,
        code TEXT NOT NULL,
        expires_at BIGINT NOT NULL,
        is_completed INTEGER NOT NULL DEFAULT 0
    )
    "#,
    // Open codes are unique; expired-but-open rows are purged before reuse.
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS ux_registration_requests_open_code
        ON registration_requests (code) WHERE is_completed = 0
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS ix_registration_requests_device
        ON registration_requests (device_id)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS device_assignments (
        id TEXT PRIMARY KEY NOT NULL,
        device_id TEXT NOT NULL UNIQUE REFERENCES devices(id) ON DELETE CASCADE,
        room_id TEXT NOT NULL REFERENCES rooms(id),
        secret_key TEXT NOT NULL,
        assigned_at BIGINT NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS ix_device_assignments_room
        ON device_assignments (room_id)
    "#,
];

const SELECT_ASSIGNMENT: &str = r#"
    SELECT a.id AS id, a.device_id AS device_id, a.room_id AS room_id,
           r.name AS room_name, a.secret_key AS secret_key, a.assigned_at AS assigned_at
    FROM device_assignments a
    JOIN rooms r ON r.id = a.room_id
    WHERE a.device_id = $1
"#;

fn to_millis(timestamp: DateTime<Utc>) -> i64 {
    timestamp.timestamp_millis()
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>, DbError> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| DbError::QueryError(format!("Invalid stored timestamp: {}", millis)))
}

// The Any driver cannot decode NULL into Option<String>, so label columns are
// selected through COALESCE and an empty string reads back as no label.
fn label_from_row(row: &AnyRow, column: &str) -> Result<Option<String>, DbError> {
    let value: String = row.try_get(column)?;
    Ok(Some(value).filter(|label| !label.is_empty()))
}

fn device_from_row(row: &AnyRow) -> Result<DeviceRecord, DbError> {
    Ok(DeviceRecord {
        id: row.try_get("id")?,
        manufacturer: label_from_row(row, "manufacturer")?,
        model: label_from_row(row, "model")?,
        created_at: from_millis(row.try_get("created_at")?)?,
    })
}

fn room_from_row(row: &AnyRow) -> Result<RoomRecord, DbError> {
    Ok(RoomRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
    })
}

fn request_from_row(row: &AnyRow) -> Result<RegistrationRequestRecord, DbError> {
    Ok(RegistrationRequestRecord {
        id: row.try_get("id")?,
        device_id: row.try_get("device_id")?,
        code: row.try_get("code")?,
        expires_at: from_millis(row.try_get("expires_at")?)?,
        is_completed: row.try_get::<i64, _>("is_completed")? != 0,
    })
}

fn assignment_from_row(row: &AnyRow) -> Result<AssignmentRecord, DbError> {
    Ok(AssignmentRecord {
        id: row.try_get("id")?,
        device_id: row.try_get("device_id")?,
        room_id: row.try_get("room_id")?,
        room_name: row.try_get("room_name")?,
        secret_key: row.try_get("secret_key")?,
        assigned_at: from_millis(row.try_get("assigned_at")?)?,
    })
}

/// Find-or-create a room on an open connection.
///
/// The insert is a no-op on a name conflict, so concurrent callers all end up
/// reading the single row that won.
async fn upsert_room(
    conn: &mut AnyConnection,
    name: &str,
    new_room_id: &str,
) -> Result<RoomRecord, DbError> {
    let inserted = sqlx::query("INSERT INTO rooms (id, name) VALUES ($1, $2) ON CONFLICT(name) DO NOTHING")
        .bind(new_room_id)
        .bind(name)
        .execute(&mut *conn)
        .await
        .map_err(|e| DbError::from_sqlx("Failed to insert room", e))?
        .rows_affected();

    if inserted > 0 {
        info!("Created room '{}'", name);
    }

    let row = sqlx::query("SELECT id, name FROM rooms WHERE name = $1")
        .bind(name)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| DbError::from_sqlx("Failed to read room", e))?;

    room_from_row(&row)
}

/// SQL implementation of the registry repository
#[derive(Debug, Clone)]
pub struct SqlRegistryRepository {
    /// The database client
    db_client: DbClient,
}

impl SqlRegistryRepository {
    /// Create a new SQL registry repository
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    /// The underlying database client
    pub fn client(&self) -> &DbClient {
        &self.db_client
    }
}

impl RegistryRepository for SqlRegistryRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing registry schema");

        for statement in SCHEMA {
            self.db_client.execute(statement).await?;
        }

        info!("Registry schema initialized successfully");
        Ok(())
    }

    async fn find_device(&self, device_id: &str) -> Result<Option<DeviceRecord>, DbError> {
        debug!("Finding device {}", device_id);

        let row = sqlx::query(
            r#"
            SELECT id, COALESCE(manufacturer, '') AS manufacturer,
                   COALESCE(model, '') AS model, created_at
            FROM devices WHERE id = $1
            "#,
        )
        .bind(device_id)
        .fetch_optional(self.db_client.pool())
        .await
        .map_err(|e| DbError::from_sqlx("Failed to find device", e))?;

        row.as_ref().map(device_from_row).transpose()
    }

    async fn find_assignment_for_device(
        &self,
        device_id: &str,
    ) -> Result<Option<AssignmentRecord>, DbError> {
        debug!("Finding assignment for device {}", device_id);

        let row = sqlx::query(SELECT_ASSIGNMENT)
            .bind(device_id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| DbError::from_sqlx("Failed to find assignment", e))?;

        row.as_ref().map(assignment_from_row).transpose()
    }

    async fn find_active_request_for_device(
        &self,
        device_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<RegistrationRequestRecord>, DbError> {
        debug!("Finding active request for device {}", device_id);

        let row = sqlx::query(
            r#"
            SELECT id, device_id, code, expires_at, is_completed
            FROM registration_requests
            WHERE device_id = $1 AND is_completed = 0 AND expires_at > $2
            ORDER BY expires_at DESC
            "#,
        )
        .bind(device_id)
        .bind(to_millis(now))
        .fetch_optional(self.db_client.pool())
        .await
        .map_err(|e| DbError::from_sqlx("Failed to find active request", e))?;

        row.as_ref().map(request_from_row).transpose()
    }

    async fn replace_pending_request(
        &self,
        request: &NewRegistrationRequest,
    ) -> Result<ReplaceRequestOutcome, DbError> {
        debug!("Replacing pending request for device {}", request.device_id);

        let now = to_millis(request.now);
        let mut tx = self.db_client.begin().await?;

        // Writing first takes the write lock before anything is read.
        sqlx::query(
            r#"
            INSERT INTO devices (id, manufacturer, model, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&request.device_id)
        .bind(request.manufacturer.as_deref())
        .bind(request.model.as_deref())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from_sqlx("Failed to upsert device", e))?;

        let superseded = sqlx::query(
            "DELETE FROM registration_requests WHERE device_id = $1 AND is_completed = 0",
        )
        .bind(&request.device_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from_sqlx("Failed to delete superseded requests", e))?
        .rows_affected();

        if superseded > 0 {
            debug!(
                "Superseded {} open request(s) for device {}",
                superseded, request.device_id
            );
        }

        // An expired open request still occupies the unique index slot.
        sqlx::query(
            r#"
            DELETE FROM registration_requests
            WHERE code = $1 AND is_completed = 0 AND expires_at <= $2
            "#,
        )
        .bind(&request.code)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from_sqlx("Failed to release expired code", e))?;

        let holders = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM registration_requests WHERE code = $1 AND is_completed = 0",
        )
        .bind(&request.code)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DbError::from_sqlx("Failed to check code usage", e))?;

        if holders > 0 {
            tx.rollback()
                .await
                .map_err(|e| DbError::TransactionError(e.to_string()))?;
            return Ok(ReplaceRequestOutcome::CodeTaken);
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO registration_requests (id, device_id, code, expires_at, is_completed)
            VALUES ($1, $2, $3, $4, 0)
            "#,
        )
        .bind(&request.request_id)
        .bind(&request.device_id)
        .bind(&request.code)
        .bind(to_millis(request.expires_at))
        .execute(&mut *tx)
        .await;

        if let Err(err) = inserted {
            // A concurrent registration committed the same code first.
            if is_unique_violation(&err) {
                tx.rollback()
                    .await
                    .map_err(|e| DbError::TransactionError(e.to_string()))?;
                return Ok(ReplaceRequestOutcome::CodeTaken);
            }
            return Err(DbError::from_sqlx("Failed to insert request", err));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;

        Ok(ReplaceRequestOutcome::Inserted(RegistrationRequestRecord {
            id: request.request_id.clone(),
            device_id: request.device_id.clone(),
            code: request.code.clone(),
            expires_at: from_millis(to_millis(request.expires_at))?,
            is_completed: false,
        }))
    }

    async fn complete_assignment(
        &self,
        code: &str,
        assignment: &NewAssignment,
    ) -> Result<Option<AssignmentRecord>, DbError> {
        debug!("Completing assignment to room '{}'", assignment.room_name);

        let now = to_millis(assignment.now);
        let mut tx = self.db_client.begin().await?;

        // Claiming the request is the lookup: only an open, unexpired row matches.
        let claimed = sqlx::query(
            r#"
            UPDATE registration_requests
            SET is_completed = 1
            WHERE code = $1 AND is_completed = 0 AND expires_at > $2
            RETURNING device_id
            "#,
        )
        .bind(code)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DbError::from_sqlx("Failed to claim registration request", e))?;

        let Some(claimed) = claimed else {
            tx.rollback()
                .await
                .map_err(|e| DbError::TransactionError(e.to_string()))?;
            return Ok(None);
        };
        let device_id: String = claimed.try_get("device_id")?;

        let room = upsert_room(&mut tx, &assignment.room_name, &assignment.room_id).await?;

        let replaced = sqlx::query("DELETE FROM device_assignments WHERE device_id = $1")
            .bind(&device_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::from_sqlx("Failed to remove previous assignments", e))?
            .rows_affected();

        if replaced > 0 {
            debug!(
                "Replaced {} previous assignment(s) of device {}",
                replaced, device_id
            );
        }

        sqlx::query(
            r#"
            INSERT INTO device_assignments (id, device_id, room_id, secret_key, assigned_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&assignment.assignment_id)
        .bind(&device_id)
        .bind(&room.id)
        .bind(&assignment.secret_key)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from_sqlx("Failed to insert assignment", e))?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;

        Ok(Some(AssignmentRecord {
            id: assignment.assignment_id.clone(),
            device_id,
            room_id: room.id,
            room_name: room.name,
            secret_key: assignment.secret_key.clone(),
            assigned_at: from_millis(now)?,
        }))
    }

    async fn update_assignment_room(
        &self,
        device_id: &str,
        room_name: &str,
        new_room_id: &str,
    ) -> Result<Option<AssignmentRecord>, DbError> {
        debug!("Moving device {} to room '{}'", device_id, room_name);

        let mut tx = self.db_client.begin().await?;

        let room = upsert_room(&mut tx, room_name, new_room_id).await?;

        let updated = sqlx::query("UPDATE device_assignments SET room_id = $1 WHERE device_id = $2")
            .bind(&room.id)
            .bind(device_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::from_sqlx("Failed to update assignment", e))?
            .rows_affected();

        if updated == 0 {
            // Also discards a room created above.
            tx.rollback()
                .await
                .map_err(|e| DbError::TransactionError(e.to_string()))?;
            return Ok(None);
        }

        let row = sqlx::query(SELECT_ASSIGNMENT)
            .bind(device_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| DbError::from_sqlx("Failed to read updated assignment", e))?;
        let assignment = assignment_from_row(&row)?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;

        Ok(Some(assignment))
    }

    async fn delete_assignments_for_device(&self, device_id: &str) -> Result<u64, DbError> {
        debug!("Deleting assignments of device {}", device_id);

        let result = sqlx::query("DELETE FROM device_assignments WHERE device_id = $1")
            .bind(device_id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| DbError::from_sqlx("Failed to delete assignments", e))?;

        Ok(result.rows_affected())
    }

    async fn list_active_requests(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<PendingRequestRow>, DbError> {
        debug!("Listing active registration requests");

        let rows = sqlx::query(
            r#"
            SELECT rr.id AS id, rr.device_id AS device_id, rr.code AS code,
                   rr.expires_at AS expires_at, rr.is_completed AS is_completed,
                   COALESCE(d.manufacturer, '') AS manufacturer, COALESCE(d.model, '') AS model
            FROM registration_requests rr
            JOIN devices d ON d.id = rr.device_id
            WHERE rr.is_completed = 0 AND rr.expires_at > $1
            ORDER BY rr.expires_at
            "#,
        )
        .bind(to_millis(now))
        .fetch_all(self.db_client.pool())
        .await
        .map_err(|e| DbError::from_sqlx("Failed to list active requests", e))?;

        rows.iter()
            .map(|row| {
                Ok(PendingRequestRow {
                    request: request_from_row(row)?,
                    manufacturer: label_from_row(row, "manufacturer")?,
                    model: label_from_row(row, "model")?,
                })
            })
            .collect()
    }

    async fn list_assignments(&self) -> Result<Vec<AssignmentListRow>, DbError> {
        debug!("Listing assignments");

        let rows = sqlx::query(
            r#"
            SELECT a.id AS id, a.device_id AS device_id, a.room_id AS room_id,
                   r.name AS room_name, a.assigned_at AS assigned_at,
                   COALESCE(d.manufacturer, '') AS manufacturer, COALESCE(d.model, '') AS model
            FROM device_assignments a
            JOIN rooms r ON r.id = a.room_id
            JOIN devices d ON d.id = a.device_id
            ORDER BY r.name, a.assigned_at
            "#,
        )
        .fetch_all(self.db_client.pool())
        .await
        .map_err(|e| DbError::from_sqlx("Failed to list assignments", e))?;

        rows.iter()
            .map(|row| {
                Ok(AssignmentListRow {
                    id: row.try_get("id")?,
                    device_id: row.try_get("device_id")?,
                    room_id: row.try_get("room_id")?,
                    room_name: row.try_get("room_name")?,
                    assigned_at: from_millis(row.try_get("assigned_at")?)?,
                    manufacturer: label_from_row(row, "manufacturer")?,
                    model: label_from_row(row, "model")?,
                })
            })
            .collect()
    }

    async fn list_rooms(&self) -> Result<Vec<RoomRecord>, DbError> {
        let rows = sqlx::query("SELECT id, name FROM rooms ORDER BY name")
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| DbError::from_sqlx("Failed to list rooms", e))?;

        rows.iter().map(room_from_row).collect()
    }

    async fn find_or_create_room(&self, name: &str, new_room_id: &str) -> Result<RoomRecord, DbError> {
        let mut tx = self.db_client.begin().await?;
        let room = upsert_room(&mut tx, name, new_room_id).await?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;
        Ok(room)
    }

    async fn find_display_assignment(
        &self,
        room_name: &str,
        secret_key: &str,
    ) -> Result<Option<DisplayAssignmentRow>, DbError> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(d.manufacturer, '') AS manufacturer, COALESCE(d.model, '') AS model,
                   r.name AS room_name, a.secret_key AS secret_key
            FROM device_assignments a
            JOIN rooms r ON r.id = a.room_id
            JOIN devices d ON d.id = a.device_id
            WHERE r.name = $1 AND a.secret_key = $2
            "#,
        )
        .bind(room_name)
        .bind(secret_key)
        .fetch_optional(self.db_client.pool())
        .await
        .map_err(|e| DbError::from_sqlx("Failed to find assignment by credentials", e))?;

        row.map(|row| {
            Ok(DisplayAssignmentRow {
                manufacturer: label_from_row(&row, "manufacturer")?,
                model: label_from_row(&row, "model")?,
                room_name: row.try_get("room_name")?,
                secret_key: row.try_get("secret_key")?,
            })
        })
        .transpose()
    }

    async fn purge_expired_requests(&self, now: DateTime<Utc>) -> Result<u64, DbError> {
        let result = sqlx::query(
            "DELETE FROM registration_requests WHERE is_completed = 0 AND expires_at <= $1",
        )
        .bind(to_millis(now))
        .execute(self.db_client.pool())
        .await
        .map_err(|e| DbError::from_sqlx("Failed to purge expired requests", e))?;

        Ok(result.rows_affected())
    }
}
