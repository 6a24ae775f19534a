// File: services/roomlink_backend/src/main.rs
use axum::{routing::get, Router};
use roomlink_common::{init_from_config, log_result};
use roomlink_config::load_config;
use roomlink_db::DbClient;
use roomlink_registry::{routes as registry_routes, spawn_expired_request_reaper, RegistryState};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() {
    let config = Arc::new(load_config().expect("Failed to load config"));

    // Keep the guard alive so buffered file logs are flushed on exit.
    let _log_guard = init_from_config(&config.logging);

    let db_config = config
        .database
        .as_ref()
        .expect("Missing [database] section in configuration");
    let db_client = DbClient::from_config(db_config)
        .await
        .expect("Failed to connect to the database");

    let state = Arc::new(RegistryState::new(db_client, &config.registry));
    log_result(
        state.engine.init_schema().await,
        "Registry schema initialized",
        "Failed to initialize the registry schema",
    )
    .expect("Failed to initialize the registry schema");

    if config.registry.reaper_interval_secs > 0 {
        spawn_expired_request_reaper(
            state.engine.clone(),
            Duration::from_secs(config.registry.reaper_interval_secs),
        );
    }

    let api_router = Router::new()
        .route("/", get(|| async { "Welcome to the Roomlink API!" }))
        .merge(registry_routes(state, config.use_legacy_devices));

    #[allow(unused_mut)] // mutated only with the openapi feature
    let mut app = Router::new().nest("/api", api_router);

    // Conditionally add Swagger UI and JSON endpoint if openapi feature enabled
    #[cfg(feature = "openapi")]
    {
        use roomlink_registry::openapi::RegistryApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "Roomlink API",
                version = "0.1.0",
                description = "Pairing registry for classroom displays"
            ),
            servers((url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(RegistryApiDoc::openapi());
        info!("Adding Swagger UI at /api/docs");

        let swagger_ui = SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc);
        app = app.merge(swagger_ui);
    }

    let app = app.layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind {}: {}", addr, e));
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .expect("Server terminated unexpectedly");
}
