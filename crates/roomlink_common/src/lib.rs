// --- File: crates/roomlink_common/src/lib.rs ---
//! Functionality shared by every Roomlink crate: the common error type and its
//! HTTP mapping, and logging initialisation.

pub mod error; // Error handling
pub mod http; // HTTP utilities
pub mod logging; // Logging utilities

// Re-export error types and utilities for easier access
pub use error::{
    internal_error, not_found, validation_error, HttpStatusCode, RoomlinkError,
};

// Re-export HTTP utilities for easier access
pub use http::{map_json_error, IntoHttpResponse};

// Re-export logging utilities for easier access
pub use logging::{init, init_from_config, init_with_level, log_result};
