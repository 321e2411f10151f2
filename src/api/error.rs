//! API error types and conversions

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::containers::ContainerNotFound;

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    /// Unknown key; carries the keys that would have matched
    NotFound {
        message: String,
        available: Vec<String>,
    },

    /// Optional upstream is not configured
    Unavailable(String),

    /// Upstream answered with an error or not at all
    BadGateway(String),

    /// Internal server error
    Internal(String),
}

impl ApiError {
    pub fn unknown_service(name: &str, available: Vec<String>) -> Self {
        ApiError::NotFound {
            message: format!("service '{name}' not found"),
            available,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound { message, available } => (
                StatusCode::NOT_FOUND,
                json!({ "error": message, "available": available }),
            ),
            ApiError::Unavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, json!({ "error": msg }))
            }
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, json!({ "error": msg })),
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg }))
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ContainerNotFound> for ApiError {
    fn from(err: ContainerNotFound) -> Self {
        ApiError::NotFound {
            message: format!("container '{}' not found", err.key),
            available: err.available,
        }
    }
}

impl From<prometheus::Error> for ApiError {
    fn from(err: prometheus::Error) -> Self {
        ApiError::Internal(format!("failed to encode metrics: {err}"))
    }
}
