// HTTP server: shared state, router assembly, and the serve loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::middleware;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

use partydeck_core::{Catalog, SessionStore};

use crate::error::{method_not_allowed_as_not_found, panic_response};
use crate::routes;

/// Handles shared by every request. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub sessions: Arc<SessionStore>,
    /// How many recent cards a session draw avoids.
    pub recent_exclusion_window: usize,
    pub started_at: Instant,
}

impl AppState {
    /// State with an empty session store.
    pub fn new(catalog: Catalog, recent_exclusion_window: usize) -> Self {
        AppState {
            catalog: Arc::new(catalog),
            sessions: Arc::new(SessionStore::new()),
            recent_exclusion_window,
            started_at: Instant::now(),
        }
    }
}

/// Every route, mounted under `/api`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/cards", routes::cards::router())
        .nest("/api/sessions", routes::sessions::router())
        .route("/api/health", get(routes::health))
        .fallback(routes::unknown_endpoint)
        .layer(middleware::map_response(method_not_allowed_as_not_found))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve requests on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local_addr = listener.local_addr()?;
    info!("Party deck server listening on http://{local_addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server on {local_addr} stopped");
    Ok(())
}

/// One line per endpoint, logged at start-up.
pub const ENDPOINTS: &[&str] = &[
    "GET    /api/health",
    "GET    /api/cards",
    "GET    /api/cards/categories",
    "GET    /api/cards/random",
    "POST   /api/cards/draw",
    "GET    /api/cards/stats",
    "POST   /api/sessions",
    "GET    /api/sessions/:id",
    "PUT    /api/sessions/:id/colors",
    "POST   /api/sessions/:id/cards",
    "POST   /api/sessions/:id/draw",
    "GET    /api/sessions/:id/history",
    "POST   /api/sessions/:id/end",
    "DELETE /api/sessions/:id",
];
