// --- File: crates/roomlink_common/src/error.rs ---
use std::fmt;
use thiserror::Error;

/// The base error type for all Roomlink errors.
///
/// Each crate keeps its own error enum and implements
/// `From<SpecificError> for RoomlinkError` so that handlers can return a single
/// type to the HTTP layer.
#[derive(Error, Debug)]
pub enum RoomlinkError {
    /// Error occurred while parsing data
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error occurred during validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error occurred during database operation
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// The store could not be reached; the caller may retry
    #[error("Service unavailable: {0}")]
    UnavailableError(String),

    /// Error occurred due to a resource not being found
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Error occurred due to a timeout
    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for RoomlinkError {
    fn status_code(&self) -> u16 {
        match self {
            RoomlinkError::ParseError(_) => 400,
            RoomlinkError::ConfigError(_) => 500,
            RoomlinkError::ValidationError(_) => 400,
            RoomlinkError::DatabaseError(_) => 500,
            RoomlinkError::UnavailableError(_) => 503,
            RoomlinkError::NotFoundError(_) => 404,
            RoomlinkError::TimeoutError(_) => 504,
            RoomlinkError::InternalError(_) => 500,
        }
    }
}

impl RoomlinkError {
    /// Whether a client may retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RoomlinkError::UnavailableError(_) | RoomlinkError::TimeoutError(_)
        )
    }
}

impl From<serde_json::Error> for RoomlinkError {
    fn from(err: serde_json::Error) -> Self {
        RoomlinkError::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for RoomlinkError {
    fn from(err: std::io::Error) -> Self {
        RoomlinkError::InternalError(err.to_string())
    }
}

// Utility functions for error handling
pub fn validation_error<T: fmt::Display>(message: T) -> RoomlinkError {
    RoomlinkError::ValidationError(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> RoomlinkError {
    RoomlinkError::NotFoundError(message.to_string())
}

pub fn internal_error<T: fmt::Display>(message: T) -> RoomlinkError {
    RoomlinkError::InternalError(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(validation_error("bad").status_code(), 400);
        assert_eq!(not_found("gone").status_code(), 404);
        assert_eq!(RoomlinkError::UnavailableError("db".into()).status_code(), 503);
        assert_eq!(RoomlinkError::TimeoutError("db".into()).status_code(), 504);
        assert_eq!(internal_error("boom").status_code(), 500);
    }

    #[test]
    fn test_retryable() {
        assert!(RoomlinkError::TimeoutError("slow".into()).is_retryable());
        assert!(RoomlinkError::UnavailableError("down".into()).is_retryable());
        assert!(!not_found("x").is_retryable());
    }
}
