//! Response envelope and error mapping
//!
//! Every endpoint answers with `{success, data?, error?}`. Status codes:
//!
//! | Outcome              | Status |
//! |----------------------|--------|
//! | success              | 200    |
//! | validation failure   | 400    |
//! | missing entity       | 404    |
//! | CAS retries exhausted| 409    |
//! | anything else        | 500    |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for request handlers
pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

/// Uniform response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// True for 2xx responses
    pub success: bool,
    /// Payload on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Message on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying `data`
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Shorthand for `Ok(ApiResponse::ok(data))`
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::ok(data))
}

/// Request failures
#[derive(Debug, Error)]
pub enum ApiError {
    /// Caller input failed a precondition
    #[error("{0}")]
    BadRequest(String),

    /// Required entity is absent
    #[error("{0}")]
    NotFound(String),

    /// Write lost every CAS attempt; the caller may retry
    #[error("{0}")]
    Conflict(String),

    /// Storage, serialization or runtime failure
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Shorthand for a 400
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    /// Shorthand for a 404
    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<docket_core::Error> for ApiError {
    fn from(err: docket_core::Error) -> Self {
        use docket_core::Error;
        match err {
            Error::Validation(msg) => ApiError::BadRequest(msg),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            conflict @ Error::ConcurrencyConflict { .. } => {
                ApiError::Conflict(conflict.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(target: "docket::api", status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(target: "docket::api", status = status.as_u16(), error = %self, "Request rejected");
        }
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.to_string()),
        };
        (status, Json(body)).into_response()
    }
}
