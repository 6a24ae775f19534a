//! HTTP handlers for the pairing registry
//!
//! Handlers translate requests into [`RegistryEngine`] calls and engine errors
//! into [`RoomlinkError`] responses.

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use roomlink_common::{map_json_error, RoomlinkError};
use roomlink_config::RegistryConfig;
use roomlink_db::{
    DbClient, LegacyDeviceRepositoryFactory, RegistryRepositoryFactory, RepositoryFactory,
    SqlLegacyDeviceRepository, SqlRegistryRepository,
};
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::engine::RegistryEngine;
use crate::legacy::LegacyDeviceService;
use crate::models::{
    AssignRequest, AssignResponse, AssignmentView, CreateRoomRequest, HealthResponse,
    PendingRequestView, RegisterRequest, RegisterResponse, RoomView, StatusQuery, StatusResponse,
    UnpairRequest, UpdateAssignmentRequest, UpdatedAssignment, ValidateQuery, ValidateResponse,
};
use crate::random::RandomSource;

/// The engine as mounted by the HTTP layer.
pub type SqlRegistryEngine = RegistryEngine<SqlRegistryRepository, SqlLegacyDeviceRepository>;

/// Shared state for registry handlers
#[derive(Clone)]
pub struct RegistryState {
    pub engine: Arc<SqlRegistryEngine>,
    pub legacy: Arc<LegacyDeviceService<SqlLegacyDeviceRepository>>,
    pub db_client: DbClient,
}

impl RegistryState {
    /// Build the engine and legacy service over one database client
    pub fn new(db_client: DbClient, config: &RegistryConfig) -> Self {
        let engine = RegistryEngine::new(
            RegistryRepositoryFactory::new().create_repository(db_client.clone()),
            LegacyDeviceRepositoryFactory::new().create_repository(db_client.clone()),
            config,
        );
        Self::from_engine(db_client, config, engine)
    }

    /// Like [`RegistryState::new`] with explicit time and randomness sources
    pub fn with_sources(
        db_client: DbClient,
        config: &RegistryConfig,
        clock: Arc<dyn Clock>,
        rng: Arc<dyn RandomSource>,
    ) -> Self {
        let engine = RegistryEngine::with_sources(
            RegistryRepositoryFactory::new().create_repository(db_client.clone()),
            LegacyDeviceRepositoryFactory::new().create_repository(db_client.clone()),
            config,
            clock,
            rng,
        );
        Self::from_engine(db_client, config, engine)
    }

    fn from_engine(db_client: DbClient, config: &RegistryConfig, engine: SqlRegistryEngine) -> Self {
        let legacy = LegacyDeviceService::new(
            LegacyDeviceRepositoryFactory::new().create_repository(db_client.clone()),
            Duration::from_millis(config.store_timeout_ms.max(1)),
        );
        Self {
            engine: Arc::new(engine),
            legacy: Arc::new(legacy),
            db_client,
        }
    }
}

/// `GET /health`: 200 when the store answers, 503 otherwise
pub async fn health_handler(State(state): State<Arc<RegistryState>>) -> impl IntoResponse {
    if state.db_client.is_healthy().await {
        (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unavailable".to_string(),
            }),
        )
    }
}

/// `GET /registry/status?deviceId=`: polled by the tablet
pub async fn get_status_handler(
    State(state): State<Arc<RegistryState>>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusResponse>, RoomlinkError> {
    let status = state.engine.get_status(&query.device_id).await;
    map_json_error(status.map(StatusResponse::from), RoomlinkError::from)
}

/// `POST /registry/register`: start or restart pairing
#[axum::debug_handler]
pub async fn register_handler(
    State(state): State<Arc<RegistryState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, RoomlinkError> {
    let issued = state
        .engine
        .register(&request.device_id, request.manufacturer, request.model)
        .await?;
    Ok(Json(issued))
}

/// `POST /registry/admin/assign`: bind a pairing code to a room
pub async fn assign_handler(
    State(state): State<Arc<RegistryState>>,
    Json(request): Json<AssignRequest>,
) -> Result<Json<AssignResponse>, RoomlinkError> {
    let assigned = state.engine.assign(&request.code, &request.room_name).await?;
    Ok(Json(assigned))
}

pub async fn list_pending_requests_handler(
    State(state): State<Arc<RegistryState>>,
) -> Result<Json<Vec<PendingRequestView>>, RoomlinkError> {
    Ok(Json(state.engine.list_pending_requests().await?))
}

pub async fn list_assignments_handler(
    State(state): State<Arc<RegistryState>>,
) -> Result<Json<Vec<AssignmentView>>, RoomlinkError> {
    Ok(Json(state.engine.list_assignments().await?))
}

/// `PUT /registry/admin/assignment`: move a device to another room
pub async fn update_assignment_handler(
    State(state): State<Arc<RegistryState>>,
    Json(request): Json<UpdateAssignmentRequest>,
) -> Result<Json<UpdatedAssignment>, RoomlinkError> {
    let updated = state
        .engine
        .update_assignment(&request.device_id, &request.room_name)
        .await?;
    Ok(Json(updated))
}

/// `DELETE /registry/admin/assignment`: unpair, idempotent
pub async fn unpair_handler(
    State(state): State<Arc<RegistryState>>,
    Json(request): Json<UnpairRequest>,
) -> Result<StatusCode, RoomlinkError> {
    state.engine.unpair(&request.device_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_rooms_handler(
    State(state): State<Arc<RegistryState>>,
) -> Result<Json<Vec<RoomView>>, RoomlinkError> {
    Ok(Json(state.engine.list_rooms().await?))
}

pub async fn create_room_handler(
    State(state): State<Arc<RegistryState>>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<Json<RoomView>, RoomlinkError> {
    Ok(Json(state.engine.create_room(&request.name).await?))
}

/// `GET /devices/validate?room=&secretUrl=`: credential check of a display
pub async fn validate_handler(
    State(state): State<Arc<RegistryState>>,
    Query(query): Query<ValidateQuery>,
) -> Result<Json<ValidateResponse>, RoomlinkError> {
    let found = state.engine.validate(&query.room, &query.secret_url).await?;
    Ok(Json(found))
}
