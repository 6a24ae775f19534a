//! Device pairing registry for Roomlink
//!
//! A classroom display tablet generates a random identifier, asks for a short
//! numeric pairing code, and shows it. An administrator binds the code to a
//! room; the tablet then receives a durable secret it presents to fetch room
//! content.
//!
//! # Features
//!
//! - Pairing state machine over a transactional SQL store ([`RegistryEngine`])
//! - Collision-safe pairing codes with bounded retries
//! - Optional background purge of expired requests
//! - Legacy flat device list and display credential validation
//! - Axum routes, with OpenAPI documentation behind the `openapi` feature
//!
//! # Example
//!
//! ```rust,no_run
//! use roomlink_config::RegistryConfig;
//! use roomlink_db::DbClient;
//! use roomlink_registry::{routes, RegistryState};
//! use std::sync::Arc;
//!
//! async fn setup_app() -> Result<axum::Router, Box<dyn std::error::Error>> {
//!     let client = DbClient::from_url("sqlite:data/roomlink.db").await?;
//!     let state = Arc::new(RegistryState::new(client, &RegistryConfig::default()));
//!     state.engine.init_schema().await?;
//!     Ok(routes(state, true))
//! }
//! ```

pub mod clock;
#[cfg(feature = "openapi")]
pub mod doc;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod legacy;
pub mod legacy_handlers;
pub mod models;
pub mod random;
pub mod reaper;
pub mod routes;

#[cfg(test)]
mod engine_test;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::RegistryEngine;
pub use error::RegistryError;
pub use handlers::{RegistryState, SqlRegistryEngine};
pub use legacy::LegacyDeviceService;
pub use random::{RandomSource, SystemRandomSource};
pub use reaper::spawn_expired_request_reaper;
pub use routes::routes;

#[cfg(feature = "openapi")]
pub mod openapi {
    pub use crate::doc::RegistryApiDoc;
}
