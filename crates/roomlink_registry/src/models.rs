//! Wire models of the registry API
//!
//! Field names are camelCase on the wire; the display tablets and the admin
//! page both poll these shapes.

use chrono::{DateTime, Utc};
use roomlink_db::{AssignmentListRow, AssignmentRecord, LegacyDevice, PendingRequestRow, RoomRecord};
use serde::{Deserialize, Serialize};

/// Where a device is in the pairing lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceStatus {
    /// The device holds an assignment
    Assigned {
        room_id: String,
        room_name: String,
        secret_key: String,
    },
    /// The device holds an active pairing code
    Pending {
        code: String,
        expires_at: DateTime<Utc>,
    },
    /// Neither of the above
    Unregistered,
}

/// Discriminator of [`StatusResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Assigned,
    Pending,
    Unregistered,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub device_id: String,
}

/// Response of `GET /registry/status`; only the fields of the current state are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: StatusKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
}

impl From<DeviceStatus> for StatusResponse {
    fn from(status: DeviceStatus) -> Self {
        let empty = StatusResponse {
            status: StatusKind::Unregistered,
            code: None,
            expires_at: None,
            room_id: None,
            room_name: None,
            secret_key: None,
        };
        match status {
            DeviceStatus::Assigned {
                room_id,
                room_name,
                secret_key,
            } => StatusResponse {
                status: StatusKind::Assigned,
                room_id: Some(room_id),
                room_name: Some(room_name),
                secret_key: Some(secret_key),
                ..empty
            },
            DeviceStatus::Pending { code, expires_at } => StatusResponse {
                status: StatusKind::Pending,
                code: Some(code),
                expires_at: Some(expires_at),
                ..empty
            },
            DeviceStatus::Unregistered => empty,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub device_id: String,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub code: String,
    pub room_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AssignResponse {
    /// Always `assigned`
    pub status: StatusKind,
    pub device_id: String,
    pub room_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssignmentRequest {
    pub device_id: String,
    pub room_name: String,
}

/// An assignment after its room changed. The secret is not echoed back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UpdatedAssignment {
    pub id: String,
    pub device_id: String,
    pub room_id: String,
    pub room_name: String,
    pub assigned_at: DateTime<Utc>,
}

impl From<AssignmentRecord> for UpdatedAssignment {
    fn from(record: AssignmentRecord) -> Self {
        Self {
            id: record.id,
            device_id: record.device_id,
            room_id: record.room_id,
            room_name: record.room_name,
            assigned_at: record.assigned_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UnpairRequest {
    pub device_id: String,
}

/// Descriptive labels of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DeviceLabels {
    pub manufacturer: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PendingRequestView {
    pub id: String,
    pub device_id: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub device: DeviceLabels,
}

impl From<PendingRequestRow> for PendingRequestView {
    fn from(row: PendingRequestRow) -> Self {
        Self {
            id: row.request.id,
            device_id: row.request.device_id,
            code: row.request.code,
            expires_at: row.request.expires_at,
            device: DeviceLabels {
                manufacturer: row.manufacturer,
                model: row.model,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AssignmentView {
    pub id: String,
    pub device_id: String,
    pub room_id: String,
    pub room_name: String,
    pub assigned_at: DateTime<Utc>,
    pub device: DeviceLabels,
}

impl From<AssignmentListRow> for AssignmentView {
    fn from(row: AssignmentListRow) -> Self {
        Self {
            id: row.id,
            device_id: row.device_id,
            room_id: row.room_id,
            room_name: row.room_name,
            assigned_at: row.assigned_at,
            device: DeviceLabels {
                manufacturer: row.manufacturer,
                model: row.model,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RoomView {
    pub id: String,
    pub name: String,
}

impl From<RoomRecord> for RoomView {
    fn from(room: RoomRecord) -> Self {
        Self {
            id: room.id,
            name: room.name,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateRoomRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateQuery {
    #[serde(default)]
    pub room: String,
    #[serde(default)]
    pub secret_url: String,
}

/// What a display learns about itself after presenting its credentials.
///
/// `id` is only set for rows of the legacy device list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct DeviceDisplayInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub device_name: String,
    pub device_classroom: String,
    #[serde(rename = "deviceURL")]
    pub device_url: String,
}

impl From<LegacyDevice> for DeviceDisplayInfo {
    fn from(device: LegacyDevice) -> Self {
        Self {
            id: Some(device.id),
            device_name: device.device_name,
            device_classroom: device.device_classroom,
            device_url: device.device_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ValidateResponse {
    pub message: String,
    pub device: DeviceDisplayInfo,
}

/// A row of the legacy device list as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct LegacyDeviceView {
    pub id: i64,
    pub device_name: String,
    pub device_classroom: String,
    #[serde(rename = "deviceURL")]
    pub device_url: String,
}

impl From<LegacyDevice> for LegacyDeviceView {
    fn from(device: LegacyDevice) -> Self {
        Self {
            id: device.id,
            device_name: device.device_name,
            device_classroom: device.device_classroom,
            device_url: device.device_url,
        }
    }
}

impl From<LegacyDeviceView> for LegacyDevice {
    fn from(view: LegacyDeviceView) -> Self {
        Self {
            id: view.id,
            device_name: view.device_name,
            device_classroom: view.device_classroom,
            device_url: view.device_url,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CreateLegacyDeviceRequest {
    pub device_name: String,
    pub device_classroom: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unregistered_status_has_no_optional_fields() {
        let value = serde_json::to_value(StatusResponse::from(DeviceStatus::Unregistered)).unwrap();
        assert_eq!(value, json!({ "status": "unregistered" }));
    }

    #[test]
    fn test_assigned_status_uses_camel_case() {
        let value = serde_json::to_value(StatusResponse::from(DeviceStatus::Assigned {
            room_id: "r1".to_string(),
            room_name: "WI WI1-308".to_string(),
            secret_key: "abc".to_string(),
        }))
        .unwrap();
        assert_eq!(
            value,
            json!({
                "status": "assigned",
                "roomId": "r1",
                "roomName": "WI WI1-308",
                "secretKey": "abc"
            })
        );
    }

    #[test]
    fn test_display_info_keeps_url_casing() {
        let value = serde_json::to_value(DeviceDisplayInfo {
            id: None,
            device_name: "Lenovo Tab".to_string(),
            device_classroom: "WI WI1-308".to_string(),
            device_url: "abc".to_string(),
        })
        .unwrap();
        assert_eq!(
            value,
            json!({
                "deviceName": "Lenovo Tab",
                "deviceClassroom": "WI WI1-308",
                "deviceURL": "abc"
            })
        );
    }

    #[test]
    fn test_register_request_labels_are_optional() {
        let request: RegisterRequest = serde_json::from_value(json!({ "deviceId": "d1" })).unwrap();
        assert_eq!(request.device_id, "d1");
        assert!(request.manufacturer.is_none());
    }
}
