#![allow(dead_code)]
use utoipa::OpenApi;

use crate::models::{
    AssignRequest, AssignResponse, AssignmentView, CreateLegacyDeviceRequest, CreateRoomRequest,
    DeviceDisplayInfo, DeviceLabels, HealthResponse, LegacyDeviceView, PendingRequestView,
    RegisterRequest, RegisterResponse, RoomView, StatusKind, StatusResponse, UnpairRequest,
    UpdateAssignmentRequest, UpdatedAssignment, ValidateResponse,
};

#[utoipa::path(
    get,
    path = "/registry/status",
    params(("deviceId" = String, Query, description = "Identifier generated by the tablet")),
    responses(
        (status = 200, description = "Current pairing state", body = StatusResponse,
         example = json!({ "status": "pending", "code": "482913", "expiresAt": "2025-03-01T08:15:00Z" })),
        (status = 400, description = "Missing or oversized device id"),
        (status = 503, description = "Store unavailable, retry later")
    ),
    tag = "Registry"
)]
fn doc_get_status_handler() {}

#[utoipa::path(
    post,
    path = "/registry/register",
    request_body(content = RegisterRequest, example = json!({
        "deviceId": "6f1c2a9e-0b7d-4a53-9d0e-3f2b8c1a7e44",
        "manufacturer": "Lenovo",
        "model": "Tab M10"
    })),
    responses(
        (status = 200, description = "Pairing code issued", body = RegisterResponse),
        (status = 503, description = "No free pairing code or store unavailable")
    ),
    tag = "Registry"
)]
fn doc_register_handler() {}

#[utoipa::path(
    post,
    path = "/registry/admin/assign",
    request_body(content = AssignRequest, example = json!({ "code": "482913", "roomName": "WI WI1-308" })),
    responses(
        (status = 200, description = "Device assigned", body = AssignResponse),
        (status = 400, description = "Invalid or expired pairing code")
    ),
    tag = "Registry Admin"
)]
fn doc_assign_handler() {}

#[utoipa::path(
    get,
    path = "/registry/admin/requests",
    responses((status = 200, description = "Active pairing requests", body = [PendingRequestView])),
    tag = "Registry Admin"
)]
fn doc_list_pending_requests_handler() {}

#[utoipa::path(
    get,
    path = "/registry/admin/devices",
    responses((status = 200, description = "Current assignments", body = [AssignmentView])),
    tag = "Registry Admin"
)]
fn doc_list_assignments_handler() {}

#[utoipa::path(
    put,
    path = "/registry/admin/assignment",
    request_body = UpdateAssignmentRequest,
    responses(
        (status = 200, description = "Room changed, secret kept", body = UpdatedAssignment),
        (status = 404, description = "Device is not assigned")
    ),
    tag = "Registry Admin"
)]
fn doc_update_assignment_handler() {}

#[utoipa::path(
    delete,
    path = "/registry/admin/assignment",
    request_body = UnpairRequest,
    responses((status = 204, description = "Device unpaired (also when it was not assigned)")),
    tag = "Registry Admin"
)]
fn doc_unpair_handler() {}

#[utoipa::path(
    get,
    path = "/registry/rooms",
    responses((status = 200, description = "All rooms", body = [RoomView])),
    tag = "Registry Admin"
)]
fn doc_list_rooms_handler() {}

#[utoipa::path(
    post,
    path = "/registry/rooms",
    request_body = CreateRoomRequest,
    responses((status = 200, description = "The room with that name", body = RoomView)),
    tag = "Registry Admin"
)]
fn doc_create_room_handler() {}

#[utoipa::path(
    get,
    path = "/devices/validate",
    params(
        ("room" = String, Query, description = "Room or classroom name"),
        ("secretUrl" = String, Query, description = "Secret key or legacy URL token")
    ),
    responses(
        (status = 200, description = "Display credentials are valid", body = ValidateResponse),
        (status = 404, description = "No device matches")
    ),
    tag = "Devices"
)]
fn doc_validate_handler() {}

#[utoipa::path(
    get,
    path = "/devices",
    responses((status = 200, description = "Legacy device list", body = [LegacyDeviceView])),
    tag = "Devices"
)]
fn doc_list_legacy_devices_handler() {}

#[utoipa::path(
    post,
    path = "/devices",
    request_body = CreateLegacyDeviceRequest,
    responses((status = 201, description = "Legacy device created", body = LegacyDeviceView)),
    tag = "Devices"
)]
fn doc_create_legacy_device_handler() {}

#[utoipa::path(
    get,
    path = "/devices/{id}",
    params(("id" = i64, Path, description = "Legacy device id")),
    responses(
        (status = 200, description = "Legacy device", body = LegacyDeviceView),
        (status = 404, description = "Not found")
    ),
    tag = "Devices"
)]
fn doc_get_legacy_device_handler() {}

#[utoipa::path(
    put,
    path = "/devices/{id}",
    params(("id" = i64, Path, description = "Legacy device id")),
    request_body = LegacyDeviceView,
    responses(
        (status = 204, description = "Updated"),
        (status = 400, description = "Path id and body id differ"),
        (status = 404, description = "Not found")
    ),
    tag = "Devices"
)]
fn doc_update_legacy_device_handler() {}

#[utoipa::path(
    delete,
    path = "/devices/{id}",
    params(("id" = i64, Path, description = "Legacy device id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found")
    ),
    tag = "Devices"
)]
fn doc_delete_legacy_device_handler() {}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Store reachable", body = HealthResponse),
        (status = 503, description = "Store unreachable", body = HealthResponse)
    ),
    tag = "Health"
)]
fn doc_health_handler() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        doc_get_status_handler,
        doc_register_handler,
        doc_assign_handler,
        doc_list_pending_requests_handler,
        doc_list_assignments_handler,
        doc_update_assignment_handler,
        doc_unpair_handler,
        doc_list_rooms_handler,
        doc_create_room_handler,
        doc_validate_handler,
        doc_list_legacy_devices_handler,
        doc_create_legacy_device_handler,
        doc_get_legacy_device_handler,
        doc_update_legacy_device_handler,
        doc_delete_legacy_device_handler,
        doc_health_handler,
    ),
    components(
        schemas(
            StatusKind,
            StatusResponse,
            RegisterRequest,
            RegisterResponse,
            AssignRequest,
            AssignResponse,
            UpdateAssignmentRequest,
            UpdatedAssignment,
            UnpairRequest,
            DeviceLabels,
            PendingRequestView,
            AssignmentView,
            RoomView,
            CreateRoomRequest,
            DeviceDisplayInfo,
            ValidateResponse,
            LegacyDeviceView,
            CreateLegacyDeviceRequest,
            HealthResponse,
        )
    ),
    tags(
        (name = "Registry", description = "Tablet pairing"),
        (name = "Registry Admin", description = "Assignment of pairing codes to rooms"),
        (name = "Devices", description = "Display credentials and the legacy device list"),
        (name = "Health", description = "Liveness of the service and its store")
    ),
    servers(
        (url = "/api", description = "Roomlink API server")
    )
)]
pub struct RegistryApiDoc;
