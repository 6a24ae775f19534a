//! Repository for the pairing registry
//!
//! Each method is one named store query. Methods that touch more than one row
//! run inside a single transaction, so callers never observe a half-applied
//! registration or assignment.

use crate::error::DbError;
use chrono::{DateTime, Utc};
use std::future::Future;

/// A physical tablet, identified by its client-generated id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    pub id: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A named room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRecord {
    pub id: String,
    pub name: String,
}

/// An in-flight pairing attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRequestRecord {
    pub id: String,
    pub device_id: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub is_completed: bool,
}

/// A device's room assignment, joined with the room name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentRecord {
    pub id: String,
    pub device_id: String,
    pub room_id: String,
    pub room_name: String,
    pub secret_key: String,
    pub assigned_at: DateTime<Utc>,
}

/// An active request joined with the labels of its device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequestRow {
    pub request: RegistrationRequestRecord,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
}

/// An assignment joined with its device and room, without the secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentListRow {
    pub id: String,
    pub device_id: String,
    pub room_id: String,
    pub room_name: String,
    pub assigned_at: DateTime<Utc>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
}

/// The fields a display needs after presenting a room and secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayAssignmentRow {
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub room_name: String,
    pub secret_key: String,
}

/// Input of [`RegistryRepository::replace_pending_request`].
#[derive(Debug, Clone)]
pub struct NewRegistrationRequest {
    pub request_id: String,
    pub device_id: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub code: String,
    pub now: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Result of trying to store a new pending request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceRequestOutcome {
    /// The request was stored and every older request of the device removed
    Inserted(RegistrationRequestRecord),
    /// Another active request holds the code; nothing was changed
    CodeTaken,
}

/// Input of [`RegistryRepository::complete_assignment`].
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub assignment_id: String,
    /// Id used if the room has to be created
    pub room_id: String,
    pub room_name: String,
    pub secret_key: String,
    pub now: DateTime<Utc>,
}

/// Store operations backing the registry engine.
pub trait RegistryRepository: Send + Sync {
    /// Create the registry tables and indexes if they don't exist
    fn init_schema(&self) -> impl Future<Output = Result<(), DbError>> + Send;

    /// The device row, if the device has ever registered
    fn find_device(
        &self,
        device_id: &str,
    ) -> impl Future<Output = Result<Option<DeviceRecord>, DbError>> + Send;

    /// The assignment of a device, joined with its room
    fn find_assignment_for_device(
        &self,
        device_id: &str,
    ) -> impl Future<Output = Result<Option<AssignmentRecord>, DbError>> + Send;

    /// The active (non-completed, unexpired at `now`) request of a device
    fn find_active_request_for_device(
        &self,
        device_id: &str,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Option<RegistrationRequestRecord>, DbError>> + Send;

    /// In one transaction: create the device if unseen (existing labels are
    /// kept), delete every non-completed request of the device, and insert the
    /// new request unless its code is held by another active request.
    fn replace_pending_request(
        &self,
        request: &NewRegistrationRequest,
    ) -> impl Future<Output = Result<ReplaceRequestOutcome, DbError>> + Send;

    /// In one transaction: claim the active request holding `code`, find or
    /// create the room, replace every assignment of the request's device with a
    /// new one. `None` when no active request holds the code.
    fn complete_assignment(
        &self,
        code: &str,
        assignment: &NewAssignment,
    ) -> impl Future<Output = Result<Option<AssignmentRecord>, DbError>> + Send;

    /// In one transaction: find or create the room and point the device's
    /// assignment at it, keeping the secret. `None` when the device has no
    /// assignment (the room is not created in that case).
    fn update_assignment_room(
        &self,
        device_id: &str,
        room_name: &str,
        new_room_id: &str,
    ) -> impl Future<Output = Result<Option<AssignmentRecord>, DbError>> + Send;

    /// Delete every assignment of a device, returning how many were removed
    fn delete_assignments_for_device(
        &self,
        device_id: &str,
    ) -> impl Future<Output = Result<u64, DbError>> + Send;

    /// Every active request joined with its device
    fn list_active_requests(
        &self,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<PendingRequestRow>, DbError>> + Send;

    /// Every assignment joined with its device and room
    fn list_assignments(
        &self,
    ) -> impl Future<Output = Result<Vec<AssignmentListRow>, DbError>> + Send;

    /// Every room, ordered by name
    fn list_rooms(&self) -> impl Future<Output = Result<Vec<RoomRecord>, DbError>> + Send;

    /// The room called `name`, created with `new_room_id` if missing
    fn find_or_create_room(
        &self,
        name: &str,
        new_room_id: &str,
    ) -> impl Future<Output = Result<RoomRecord, DbError>> + Send;

    /// The assignment whose room name and secret both match exactly
    fn find_display_assignment(
        &self,
        room_name: &str,
        secret_key: &str,
    ) -> impl Future<Output = Result<Option<DisplayAssignmentRow>, DbError>> + Send;

    /// Delete non-completed requests that expired at or before `now`
    fn purge_expired_requests(
        &self,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<u64, DbError>> + Send;
}
