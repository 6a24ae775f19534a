use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::handlers::{
    assign_handler, create_room_handler, get_status_handler, health_handler,
    list_assignments_handler, list_pending_requests_handler, list_rooms_handler,
    register_handler, unpair_handler, update_assignment_handler, validate_handler, RegistryState,
};
use crate::legacy_handlers::{
    create_legacy_device_handler, delete_legacy_device_handler, get_legacy_device_handler,
    list_legacy_devices_handler, update_legacy_device_handler,
};

/// Create the registry routes
///
/// Mount the returned router under `/api`. The legacy device list CRUD routes
/// are only added when `include_legacy_devices` is set; credential validation
/// is always available.
pub fn routes(state: Arc<RegistryState>, include_legacy_devices: bool) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route("/registry/status", get(get_status_handler))
        .route("/registry/register", post(register_handler))
        .route("/registry/admin/assign", post(assign_handler))
        .route("/registry/admin/requests", get(list_pending_requests_handler))
        .route("/registry/admin/devices", get(list_assignments_handler))
        .route(
            "/registry/admin/assignment",
            put(update_assignment_handler).delete(unpair_handler),
        )
        .route(
            "/registry/rooms",
            get(list_rooms_handler).post(create_room_handler),
        )
        .route("/devices/validate", get(validate_handler));

    if include_legacy_devices {
        router = router
            .route(
                "/devices",
                get(list_legacy_devices_handler).post(create_legacy_device_handler),
            )
            .route(
                "/devices/{id}",
                get(get_legacy_device_handler)
                    .put(update_legacy_device_handler)
                    .delete(delete_legacy_device_handler),
            );
    }

    info!(
        "Registry routes initialized (legacy device list: {})",
        include_legacy_devices
    );

    router.layer(CorsLayer::permissive()).with_state(state)
}
