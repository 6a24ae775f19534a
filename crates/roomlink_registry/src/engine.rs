//! The registry engine
//!
//! Owns the pairing lifecycle of a device:
//! unregistered → pending (short-lived numeric code) → assigned (durable secret).
//! Every multi-row transition is a single store transaction; the engine itself
//! keeps no mutable state between calls.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as TimeDelta;
use roomlink_config::RegistryConfig;
use roomlink_db::{
    DbError, LegacyDeviceRepository, NewAssignment, NewRegistrationRequest, RegistryRepository,
    ReplaceRequestOutcome,
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::error::RegistryError;
use crate::models::{
    AssignResponse, AssignmentView, DeviceDisplayInfo, DeviceStatus, PendingRequestView,
    RegisterResponse, RoomView, StatusKind, UpdatedAssignment, ValidateResponse,
};
use crate::random::{is_pairing_code, pairing_code, secret_key, RandomSource, SystemRandomSource};

/// Longest accepted device id.
pub const MAX_DEVICE_ID_LEN: usize = 128;

pub(crate) const LEGACY_MATCH_MESSAGE: &str = "Device found (legacy).";
pub(crate) const ASSIGNMENT_MATCH_MESSAGE: &str = "Device found.";

/// Run a store operation with an upper time bound.
pub(crate) async fn bounded<T, F>(
    limit: Duration,
    operation: &'static str,
    fut: F,
) -> Result<T, RegistryError>
where
    F: Future<Output = Result<T, DbError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(RegistryError::from),
        Err(_) => {
            error!("Store operation '{}' timed out after {:?}", operation, limit);
            Err(RegistryError::Timeout(operation))
        }
    }
}

fn check_device_id(device_id: &str) -> Result<(), RegistryError> {
    if device_id.trim().is_empty() {
        return Err(RegistryError::Validation("deviceId must not be empty".to_string()));
    }
    if device_id.len() > MAX_DEVICE_ID_LEN {
        return Err(RegistryError::Validation(format!(
            "deviceId must be at most {} characters",
            MAX_DEVICE_ID_LEN
        )));
    }
    Ok(())
}

fn check_room_name(room_name: &str) -> Result<(), RegistryError> {
    if room_name.trim().is_empty() {
        return Err(RegistryError::Validation("room name must not be empty".to_string()));
    }
    Ok(())
}

fn label(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Pairing state machine over a registry store.
pub struct RegistryEngine<R, L> {
    repo: R,
    legacy: L,
    clock: Arc<dyn Clock>,
    rng: Arc<dyn RandomSource>,
    code_ttl: TimeDelta,
    max_code_attempts: u32,
    store_timeout: Duration,
}

impl<R, L> RegistryEngine<R, L>
where
    R: RegistryRepository,
    L: LegacyDeviceRepository,
{
    /// Engine over the wall clock and the system CSPRNG
    pub fn new(repo: R, legacy: L, config: &RegistryConfig) -> Self {
        Self::with_sources(
            repo,
            legacy,
            config,
            Arc::new(SystemClock),
            Arc::new(SystemRandomSource::new()),
        )
    }

    /// Engine with explicit time and randomness sources
    pub fn with_sources(
        repo: R,
        legacy: L,
        config: &RegistryConfig,
        clock: Arc<dyn Clock>,
        rng: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            repo,
            legacy,
            clock,
            rng,
            code_ttl: TimeDelta::minutes(config.code_ttl_minutes.max(1)),
            max_code_attempts: config.max_code_attempts.max(1),
            store_timeout: Duration::from_millis(config.store_timeout_ms.max(1)),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub(crate) async fn store<T, F>(&self, operation: &'static str, fut: F) -> Result<T, RegistryError>
    where
        F: Future<Output = Result<T, DbError>>,
    {
        bounded(self.store_timeout, operation, fut).await
    }

    /// Create the registry and legacy tables
    pub async fn init_schema(&self) -> Result<(), RegistryError> {
        self.store("init_schema", self.repo.init_schema()).await?;
        self.store("init_legacy_schema", self.legacy.init_schema()).await
    }

    /// Current state of a device. Read-only.
    pub async fn get_status(&self, device_id: &str) -> Result<DeviceStatus, RegistryError> {
        check_device_id(device_id)?;

        if let Some(assignment) = self
            .store(
                "find_assignment_for_device",
                self.repo.find_assignment_for_device(device_id),
            )
            .await?
        {
            return Ok(DeviceStatus::Assigned {
                room_id: assignment.room_id,
                room_name: assignment.room_name,
                secret_key: assignment.secret_key,
            });
        }

        let now = self.clock.now();
        if let Some(request) = self
            .store(
                "find_active_request_for_device",
                self.repo.find_active_request_for_device(device_id, now),
            )
            .await?
        {
            return Ok(DeviceStatus::Pending {
                code: request.code,
                expires_at: request.expires_at,
            });
        }

        Ok(DeviceStatus::Unregistered)
    }

    /// Issue a fresh pairing code, replacing any open request of the device.
    ///
    /// A code held by another active request is redrawn, up to the configured
    /// number of attempts.
    pub async fn register(
        &self,
        device_id: &str,
        manufacturer: Option<String>,
        model: Option<String>,
    ) -> Result<RegisterResponse, RegistryError> {
        check_device_id(device_id)?;

        let manufacturer = label(manufacturer);
        let model = label(model);

        for attempt in 1..=self.max_code_attempts {
            let now = self.clock.now();
            let request = NewRegistrationRequest {
                request_id: Uuid::new_v4().to_string(),
                device_id: device_id.to_string(),
                manufacturer: manufacturer.clone(),
                model: model.clone(),
                code: pairing_code(self.rng.as_ref())?,
                now,
                expires_at: now + self.code_ttl,
            };

            match self
                .store("replace_pending_request", self.repo.replace_pending_request(&request))
                .await?
            {
                ReplaceRequestOutcome::Inserted(stored) => {
                    info!("Issued pairing code for device {}", device_id);
                    return Ok(RegisterResponse {
                        code: stored.code,
                        expires_at: stored.expires_at,
                    });
                }
                ReplaceRequestOutcome::CodeTaken => {
                    debug!(
                        "Pairing code collision for device {} (attempt {}/{})",
                        device_id, attempt, self.max_code_attempts
                    );
                }
            }
        }

        warn!(
            "No free pairing code for device {} after {} attempts",
            device_id, self.max_code_attempts
        );
        Err(RegistryError::CodeGenerationExhausted {
            attempts: self.max_code_attempts,
        })
    }

    /// Bind the device holding `code` to the room called `room_name`.
    pub async fn assign(&self, code: &str, room_name: &str) -> Result<AssignResponse, RegistryError> {
        check_room_name(room_name)?;

        let code = code.trim();
        if !is_pairing_code(code) {
            debug!("Rejected malformed pairing code");
            return Err(RegistryError::InvalidCode);
        }

        let assignment = NewAssignment {
            assignment_id: Uuid::new_v4().to_string(),
            room_id: Uuid::new_v4().to_string(),
            room_name: room_name.to_string(),
            secret_key: secret_key(self.rng.as_ref())?,
            now: self.clock.now(),
        };

        match self
            .store("complete_assignment", self.repo.complete_assignment(code, &assignment))
            .await?
        {
            Some(assigned) => {
                info!(
                    "Device {} assigned to room '{}'",
                    assigned.device_id, assigned.room_name
                );
                Ok(AssignResponse {
                    status: StatusKind::Assigned,
                    device_id: assigned.device_id,
                    room_id: assigned.room_id,
                })
            }
            None => {
                debug!("Pairing code did not match an active request");
                Err(RegistryError::InvalidCode)
            }
        }
    }

    /// Move an assigned device to another room, keeping its secret.
    pub async fn update_assignment(
        &self,
        device_id: &str,
        room_name: &str,
    ) -> Result<UpdatedAssignment, RegistryError> {
        check_device_id(device_id)?;
        check_room_name(room_name)?;

        let room_id = Uuid::new_v4().to_string();
        let updated = self
            .store(
                "update_assignment_room",
                self.repo.update_assignment_room(device_id, room_name, &room_id),
            )
            .await?
            .ok_or_else(|| RegistryError::NotAssigned(device_id.to_string()))?;

        info!("Device {} moved to room '{}'", device_id, updated.room_name);
        Ok(updated.into())
    }

    /// Remove every assignment of a device. A no-op for unassigned devices.
    pub async fn unpair(&self, device_id: &str) -> Result<(), RegistryError> {
        check_device_id(device_id)?;

        let removed = self
            .store(
                "delete_assignments_for_device",
                self.repo.delete_assignments_for_device(device_id),
            )
            .await?;

        if removed > 0 {
            info!("Device {} unpaired", device_id);
        } else {
            debug!("Unpair of device {} removed nothing", device_id);
        }
        Ok(())
    }

    pub async fn list_pending_requests(&self) -> Result<Vec<PendingRequestView>, RegistryError> {
        let now = self.clock.now();
        let rows = self
            .store("list_active_requests", self.repo.list_active_requests(now))
            .await?;
        Ok(rows.into_iter().map(PendingRequestView::from).collect())
    }

    pub async fn list_assignments(&self) -> Result<Vec<AssignmentView>, RegistryError> {
        let rows = self
            .store("list_assignments", self.repo.list_assignments())
            .await?;
        Ok(rows.into_iter().map(AssignmentView::from).collect())
    }

    pub async fn list_rooms(&self) -> Result<Vec<RoomView>, RegistryError> {
        let rooms = self.store("list_rooms", self.repo.list_rooms()).await?;
        Ok(rooms.into_iter().map(RoomView::from).collect())
    }

    /// Find or create a room by exact name
    pub async fn create_room(&self, name: &str) -> Result<RoomView, RegistryError> {
        check_room_name(name)?;

        let room_id = Uuid::new_v4().to_string();
        let room = self
            .store("find_or_create_room", self.repo.find_or_create_room(name, &room_id))
            .await?;
        Ok(room.into())
    }

    /// Resolve a display's room and secret.
    ///
    /// The legacy device list is consulted first, then the assignments.
    pub async fn validate(&self, room: &str, secret_url: &str) -> Result<ValidateResponse, RegistryError> {
        if let Some(device) = self
            .store(
                "find_legacy_device",
                self.legacy.find_by_classroom_and_url(room, secret_url),
            )
            .await?
        {
            debug!("Display credentials matched legacy device {}", device.id);
            return Ok(ValidateResponse {
                message: LEGACY_MATCH_MESSAGE.to_string(),
                device: device.into(),
            });
        }

        if let Some(found) = self
            .store(
                "find_display_assignment",
                self.repo.find_display_assignment(room, secret_url),
            )
            .await?
        {
            let device_name = format!(
                "{} {}",
                found.manufacturer.unwrap_or_default(),
                found.model.unwrap_or_default()
            );
            return Ok(ValidateResponse {
                message: ASSIGNMENT_MATCH_MESSAGE.to_string(),
                device: DeviceDisplayInfo {
                    id: None,
                    device_name: device_name.trim().to_string(),
                    device_classroom: found.room_name,
                    device_url: found.secret_key,
                },
            });
        }

        Err(RegistryError::NotFound(
            "No device found for the given room and secretUrl".to_string(),
        ))
    }

    /// Delete expired open requests, returning how many were removed
    pub async fn purge_expired(&self) -> Result<u64, RegistryError> {
        let now = self.clock.now();
        self.store("purge_expired_requests", self.repo.purge_expired_requests(now))
            .await
    }
}
