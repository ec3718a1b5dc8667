// Response envelope, API errors, and extractors that report rejections
// through the envelope.

use std::any::Any;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Message sent instead of internal error details.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Message for requests that match no route.
pub const UNKNOWN_ENDPOINT_MESSAGE: &str = "Endpoint not found";

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// `{success, data?, error?}` wrapper used for every response body.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or insufficient request payload. Maps to 400.
    #[error("{0}")]
    InvalidInput(String),

    /// Missing session, unmatched card filter, or unknown route. Maps to 404.
    #[error("{0}")]
    NotFound(String),

    /// Anything unexpected. Logged, then reported as an opaque 500.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<partydeck_core::Error> for ApiError {
    fn from(err: partydeck_core::Error) -> Self {
        match err {
            partydeck_core::Error::InvalidInput(msg) => ApiError::InvalidInput(msg),
            partydeck_core::Error::NotFound(msg) => ApiError::NotFound(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Internal(detail) => {
                error!("Request failed: {detail}");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
            ApiError::InvalidInput(msg) | ApiError::NotFound(msg) => msg,
        };
        (status, ApiResponse::failure(message)).into_response()
    }
}

/// Rewrite the router's bare 405 for a known path with the wrong method into
/// the enveloped 404 unknown routes get.
pub async fn method_not_allowed_as_not_found(response: Response) -> Response {
    if response.status() == StatusCode::METHOD_NOT_ALLOWED {
        return ApiError::NotFound(UNKNOWN_ENDPOINT_MESSAGE.into()).into_response();
    }
    response
}

/// Convert a handler panic into an enveloped 500.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("handler panicked");
    ApiError::Internal(format!("panic: {detail}")).into_response()
}

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

/// `axum::Json` whose rejections become enveloped 400s.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Query` whose rejections become enveloped 400s.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// `axum::extract::Path` whose rejections become enveloped 400s.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
