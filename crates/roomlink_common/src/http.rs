// --- File: crates/roomlink_common/src/http.rs ---
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, error};

use crate::error::{HttpStatusCode, RoomlinkError};

/// Seconds a polling client should wait before retrying a transient failure.
pub const RETRY_AFTER_SECS: u64 = 3;

/// Extension trait for RoomlinkError to convert it to an Axum HTTP response.
pub trait IntoHttpResponse {
    /// Converts the error into an Axum HTTP response.
    fn into_http_response(self) -> Response;
}

impl IntoHttpResponse for RoomlinkError {
    fn into_http_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let error_message = self.to_string();
        if status_code.is_server_error() {
            error!("Request failed with {}: {}", status_code, error_message);
        } else {
            debug!("Request rejected with {}: {}", status_code, error_message);
        }

        let body = Json(json!({
            "error": {
                "message": error_message,
                "code": status_code.as_u16(),
            }
        }));

        let mut response = (status_code, body).into_response();
        if self.is_retryable() {
            response.headers_mut().insert(
                header::RETRY_AFTER,
                HeaderValue::from(RETRY_AFTER_SECS),
            );
        }
        response
    }
}

/// Implement IntoResponse for RoomlinkError to make it easier to use in Axum handlers.
impl IntoResponse for RoomlinkError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}

/// Converts a `Result<T, E>` into a JSON handler result using a custom error mapper.
pub fn map_json_error<T, E, F>(result: Result<T, E>, f: F) -> Result<Json<T>, RoomlinkError>
where
    T: serde::Serialize,
    F: FnOnce(E) -> RoomlinkError,
{
    result.map(Json).map_err(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::not_found;

    #[test]
    fn test_error_response_status_and_body() {
        let response = not_found("room").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::RETRY_AFTER).is_none());
    }

    #[test]
    fn test_retryable_error_sets_retry_after() {
        let response = RoomlinkError::TimeoutError("store".into()).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            response.headers().get(header::RETRY_AFTER),
            Some(&HeaderValue::from(RETRY_AFTER_SECS))
        );
    }

    #[test]
    fn test_map_json_error() {
        let ok: Result<u8, &str> = Ok(7);
        assert_eq!(map_json_error(ok, not_found).map(|j| j.0).ok(), Some(7));

        let err: Result<u8, &str> = Err("device");
        let mapped = map_json_error(err, not_found).unwrap_err();
        assert_eq!(mapped.to_string(), "Not found: device");
    }
}
