//! HTTP handlers for the legacy device list

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use roomlink_common::RoomlinkError;
use std::sync::Arc;

use crate::handlers::RegistryState;
use crate::models::{CreateLegacyDeviceRequest, LegacyDeviceView};

pub async fn list_legacy_devices_handler(
    State(state): State<Arc<RegistryState>>,
) -> Result<Json<Vec<LegacyDeviceView>>, RoomlinkError> {
    Ok(Json(state.legacy.list().await?))
}

pub async fn get_legacy_device_handler(
    State(state): State<Arc<RegistryState>>,
    Path(id): Path<i64>,
) -> Result<Json<LegacyDeviceView>, RoomlinkError> {
    Ok(Json(state.legacy.get(id).await?))
}

pub async fn create_legacy_device_handler(
    State(state): State<Arc<RegistryState>>,
    Json(request): Json<CreateLegacyDeviceRequest>,
) -> Result<(StatusCode, Json<LegacyDeviceView>), RoomlinkError> {
    let created = state.legacy.create(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_legacy_device_handler(
    State(state): State<Arc<RegistryState>>,
    Path(id): Path<i64>,
    Json(device): Json<LegacyDeviceView>,
) -> Result<StatusCode, RoomlinkError> {
    state.legacy.update(id, device).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_legacy_device_handler(
    State(state): State<Arc<RegistryState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, RoomlinkError> {
    state.legacy.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
