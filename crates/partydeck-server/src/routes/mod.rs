// Route handlers, grouped by resource.

pub mod cards;
pub mod sessions;

use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{ApiError, ApiResponse, UNKNOWN_ENDPOINT_MESSAGE};
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    /// Seconds since the server state was created.
    pub uptime: f64,
}

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> ApiResponse<Health> {
    ApiResponse::ok(Health {
        status: "ok",
        timestamp: Utc::now(),
        uptime: state.started_at.elapsed().as_secs_f64(),
    })
}

/// Fallback for requests that match no route.
pub async fn unknown_endpoint() -> ApiError {
    ApiError::NotFound(UNKNOWN_ENDPOINT_MESSAGE.into())
}
