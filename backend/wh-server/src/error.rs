//! Server errors: startup failures and JSON error responses.

use std::panic::Location;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use error_location::ErrorLocation;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Config error: {0}")]
    Config(#[from] wh_config::ConfigError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ServerResult<T> = std::result::Result<T, ServerError>;

/// JSON error response body
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub error: String,
}

/// Request errors with associated HTTP status codes
#[derive(Debug, Error)]
pub enum ApiError {
    /// Signature header does not match the payload (401)
    #[error("Invalid signature {location}")]
    InvalidSignature { location: ErrorLocation },

    /// Body is not valid JSON (400)
    #[error("Invalid JSON payload: {message} {location}")]
    InvalidPayload {
        message: String,
        location: ErrorLocation,
    },

    /// Internal server error (500)
    #[error("Internal error: {message} {location}")]
    Internal {
        message: String,
        location: ErrorLocation,
    },
}

impl ApiError {
    #[track_caller]
    pub fn invalid_signature() -> Self {
        Self::InvalidSignature {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        log::warn!("{}", self);

        let (status, error) = match self {
            ApiError::InvalidSignature { .. } => {
                (StatusCode::UNAUTHORIZED, "Invalid signature".to_string())
            }
            ApiError::InvalidPayload { .. } => {
                (StatusCode::BAD_REQUEST, "Invalid JSON payload".to_string())
            }
            ApiError::Internal { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(ApiErrorResponse { error })).into_response()
    }
}
