// --- File: crates/roomlink_registry/src/error.rs ---
use roomlink_common::{HttpStatusCode, RoomlinkError};
use roomlink_db::DbError;
use thiserror::Error;

/// Registry-specific error types.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The request is malformed (empty device id, empty room name, ...)
    #[error("Invalid request: {0}")]
    Validation(String),

    /// No device matches the presented room and secret
    #[error("Not found: {0}")]
    NotFound(String),

    /// The pairing code does not belong to an active request.
    /// Unknown, expired and already used codes are deliberately not told apart.
    #[error("Invalid or expired pairing code")]
    InvalidCode,

    /// The device has no assignment to update
    #[error("Device {0} is not assigned to a room")]
    NotAssigned(String),

    /// Every generated code collided with an active request
    #[error("No free pairing code after {attempts} attempts")]
    CodeGenerationExhausted { attempts: u32 },

    /// The store could not be reached
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A store operation did not finish in time
    #[error("Store operation '{0}' timed out")]
    Timeout(&'static str),

    /// Any other store failure
    #[error("Store error: {0}")]
    Store(String),

    /// The system random source failed
    #[error("Random source failure")]
    Random,
}

impl RegistryError {
    /// Whether the client may retry the same call later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RegistryError::CodeGenerationExhausted { .. }
                | RegistryError::StoreUnavailable(_)
                | RegistryError::Timeout(_)
        )
    }
}

impl From<DbError> for RegistryError {
    fn from(err: DbError) -> Self {
        if err.is_unavailable() {
            RegistryError::StoreUnavailable(err.to_string())
        } else {
            RegistryError::Store(err.to_string())
        }
    }
}

impl HttpStatusCode for RegistryError {
    fn status_code(&self) -> u16 {
        match self {
            RegistryError::Validation(_) => 400,
            RegistryError::InvalidCode => 400,
            RegistryError::NotFound(_) => 404,
            RegistryError::NotAssigned(_) => 404,
            RegistryError::CodeGenerationExhausted { .. } => 503,
            RegistryError::StoreUnavailable(_) => 503,
            RegistryError::Timeout(_) => 504,
            RegistryError::Store(_) => 500,
            RegistryError::Random => 500,
        }
    }
}

/// Convert RegistryError to RoomlinkError
impl From<RegistryError> for RoomlinkError {
    fn from(err: RegistryError) -> Self {
        let message = err.to_string();
        match err {
            RegistryError::Validation(_) | RegistryError::InvalidCode => {
                RoomlinkError::ValidationError(message)
            }
            RegistryError::NotFound(_) | RegistryError::NotAssigned(_) => {
                RoomlinkError::NotFoundError(message)
            }
            RegistryError::CodeGenerationExhausted { .. } | RegistryError::StoreUnavailable(_) => {
                RoomlinkError::UnavailableError(message)
            }
            RegistryError::Timeout(_) => RoomlinkError::TimeoutError(message),
            RegistryError::Store(_) => RoomlinkError::DatabaseError(message),
            RegistryError::Random => RoomlinkError::InternalError(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_survive_conversion() {
        let errors = vec![
            RegistryError::Validation("deviceId".to_string()),
            RegistryError::NotFound("device".to_string()),
            RegistryError::InvalidCode,
            RegistryError::NotAssigned("d1".to_string()),
            RegistryError::CodeGenerationExhausted { attempts: 10 },
            RegistryError::StoreUnavailable("pool timed out".to_string()),
            RegistryError::Timeout("register"),
            RegistryError::Store("syntax".to_string()),
            RegistryError::Random,
        ];

        for err in errors {
            let status = err.status_code();
            let retryable = err.is_retryable();
            let common: RoomlinkError = err.into();
            assert_eq!(common.status_code(), status);
            assert_eq!(common.is_retryable(), retryable);
        }
    }

    #[test]
    fn test_db_errors_are_classified() {
        let unavailable: RegistryError = DbError::Unavailable("closed".to_string()).into();
        assert!(matches!(unavailable, RegistryError::StoreUnavailable(_)));

        let query: RegistryError = DbError::QueryError("bad".to_string()).into();
        assert!(matches!(query, RegistryError::Store(_)));
    }
}
