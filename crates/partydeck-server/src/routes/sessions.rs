// /api/sessions: game session lifecycle and history.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use partydeck_core::{Category, Color, DrawFilter, DrawnCard, GameSession, History};

use crate::error::{ApiError, ApiJson, ApiPath, ApiResponse};
use crate::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session))
        .route("/:id", get(get_session).delete(delete_session))
        .route("/:id/colors", put(update_colors))
        .route("/:id/cards", post(append_card))
        .route("/:id/draw", post(draw_for_session))
        .route("/:id/history", get(history))
        .route("/:id/end", post(end_session))
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Body of POST /api/sessions and PUT /api/sessions/:id/colors.
#[derive(Debug, Default, Deserialize)]
pub struct ColorsRequest {
    #[serde(default)]
    pub colors: Option<Vec<Color>>,
}

/// Body of POST /api/sessions/:id/cards.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendCardRequest {
    #[serde(default)]
    pub drawn_card: Option<DrawnCard>,
}

/// Optional body of POST /api/sessions/:id/draw.
#[derive(Debug, Default, Deserialize)]
pub struct SessionDrawRequest {
    #[serde(default)]
    pub category: Option<Category>,
}

impl SessionDrawRequest {
    /// An empty body is the same as `{}`.
    fn parse(body: &[u8]) -> Result<Self, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| ApiError::InvalidInput(format!("invalid request body: {e}")))
    }
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub message: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/sessions
async fn create_session(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ColorsRequest>,
) -> Result<(StatusCode, ApiResponse<GameSession>), ApiError> {
    let session = state.sessions.create(request.colors.unwrap_or_default())?;
    info!(
        "Session {} started with {} colors ({} live)",
        session.id,
        session.colors.len(),
        state.sessions.len()
    );
    Ok((StatusCode::CREATED, ApiResponse::ok(session)))
}

/// GET /api/sessions/:id
async fn get_session(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<ApiResponse<GameSession>, ApiError> {
    Ok(ApiResponse::ok(state.sessions.get(&id)?))
}

/// PUT /api/sessions/:id/colors
async fn update_colors(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<ColorsRequest>,
) -> Result<ApiResponse<GameSession>, ApiError> {
    let session = state
        .sessions
        .update_colors(&id, request.colors.unwrap_or_default())?;
    Ok(ApiResponse::ok(session))
}

/// POST /api/sessions/:id/cards
async fn append_card(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<AppendCardRequest>,
) -> Result<ApiResponse<GameSession>, ApiError> {
    let session = state.sessions.append_drawn_card(&id, request.drawn_card)?;
    Ok(ApiResponse::ok(session))
}

/// POST /api/sessions/:id/draw
///
/// Draws with the session's own colors, avoiding its most recent cards, and
/// records the result in the session history. If avoiding recent cards
/// leaves nothing to draw, the draw is retried without the exclusion. Ended
/// sessions are rejected.
async fn draw_for_session(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    body: Bytes,
) -> Result<ApiResponse<DrawnCard>, ApiError> {
    let request = SessionDrawRequest::parse(&body)?;
    let catalog = &state.catalog;

    let drawn = state
        .sessions
        .record_draw(&id, state.recent_exclusion_window, |colors, recent| {
            let mut filter = DrawFilter {
                category: request.category,
                exclude_ids: recent,
            };
            match catalog.draw(colors, &filter) {
                Err(partydeck_core::Error::NotFound(_)) if !filter.exclude_ids.is_empty() => {
                    debug!("Session {id}: every candidate was drawn recently, allowing repeats");
                    filter.exclude_ids.clear();
                    catalog.draw(colors, &filter)
                }
                other => other,
            }
        })?;

    debug!("Session {id}: drew card {}", drawn.card.id);
    Ok(ApiResponse::ok(drawn))
}

/// GET /api/sessions/:id/history
async fn history(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<ApiResponse<History>, ApiError> {
    Ok(ApiResponse::ok(state.sessions.history(&id)?))
}

/// DELETE /api/sessions/:id
async fn delete_session(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<ApiResponse<Deleted>, ApiError> {
    state.sessions.delete(&id)?;
    info!("Session {id} deleted ({} live)", state.sessions.len());
    Ok(ApiResponse::ok(Deleted {
        message: "Session deleted".into(),
    }))
}

/// POST /api/sessions/:id/end
async fn end_session(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<ApiResponse<GameSession>, ApiError> {
    let session = state.sessions.end(&id)?;
    info!("Session {id} ended after {} draws", session.drawn_cards.len());
    Ok(ApiResponse::ok(session))
}
