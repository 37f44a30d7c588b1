//! HTTP error type and mappings from runtime errors to status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use recwatch_core::ConfigError;
use recwatch_runtime::ProcessError;
use serde::Serialize;
use thiserror::Error;

/// Web-facing error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Invalid input from the client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A lifecycle command is already in flight.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The worker could not be started.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Self::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = ErrorBody {
            error: message,
            status: status.as_u16(),
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<ProcessError> for HttpError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::Busy => Self::Conflict(err.to_string()),
            ProcessError::SpawnFailed { .. } => Self::ServiceUnavailable(err.to_string()),
            ProcessError::TerminateFailed(_) => Self::Internal(err.to_string()),
            ProcessError::Config(e) => e.into(),
        }
    }
}

impl From<ConfigError> for HttpError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Parse { .. } => Self::BadRequest(err.to_string()),
            ConfigError::Io { .. } => Self::Internal(err.to_string()),
        }
    }
}
