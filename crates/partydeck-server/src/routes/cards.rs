// /api/cards: catalog queries and stateless draws.

use std::collections::{BTreeMap, HashSet};

use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::debug;

use partydeck_core::{Card, CardFilter, Catalog, CatalogStats, Category, CategoryInfo, Color, DrawFilter, DrawnCard};

use crate::error::{ApiError, ApiJson, ApiQuery, ApiResponse};
use crate::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_cards))
        .route("/categories", get(list_categories))
        .route("/random", get(random_card))
        .route("/draw", post(draw_card))
        .route("/stats", get(stats))
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct CardList {
    pub cards: Vec<Card>,
    pub total: usize,
}

/// Query string of GET /api/cards/random. Values arrive as text and are
/// validated in [`RandomQuery::into_filter`]; empty values count as absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomQuery {
    pub category: Option<String>,
    pub color_count: Option<String>,
    /// Comma-separated card ids.
    pub exclude_ids: Option<String>,
}

impl RandomQuery {
    pub fn into_filter(self) -> Result<CardFilter, ApiError> {
        let category = match non_empty(self.category) {
            Some(tag) => Some(
                Category::from_tag(&tag)
                    .ok_or_else(|| ApiError::InvalidInput(format!("unknown category `{tag}`")))?,
            ),
            None => None,
        };

        let max_color_count = match non_empty(self.color_count) {
            Some(raw) => Some(raw.parse::<u32>().map_err(|_| {
                ApiError::InvalidInput(format!("colorCount must be a non-negative integer, got `{raw}`"))
            })?),
            None => None,
        };

        let exclude_ids = self
            .exclude_ids
            .as_deref()
            .map(split_ids)
            .unwrap_or_default();

        Ok(CardFilter {
            category,
            max_color_count,
            exclude_ids,
        })
    }
}

/// Body of POST /api/cards/draw.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawRequest {
    #[serde(default)]
    pub colors: Option<Vec<Color>>,
    #[serde(default)]
    pub exclude_ids: Option<Vec<String>>,
    #[serde(default)]
    pub category: Option<Category>,
}

impl DrawRequest {
    fn into_parts(self) -> (Vec<Color>, DrawFilter) {
        let filter = DrawFilter {
            category: self.category,
            exclude_ids: self.exclude_ids.unwrap_or_default().into_iter().collect(),
        };
        (self.colors.unwrap_or_default(), filter)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_ids(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/cards
async fn list_cards(State(state): State<AppState>) -> ApiResponse<CardList> {
    let cards = state.catalog.list_all().to_vec();
    let total = cards.len();
    ApiResponse::ok(CardList { cards, total })
}

/// GET /api/cards/categories
async fn list_categories() -> ApiResponse<BTreeMap<Category, CategoryInfo>> {
    ApiResponse::ok(Catalog::list_categories())
}

/// GET /api/cards/random
async fn random_card(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RandomQuery>,
) -> Result<ApiResponse<Card>, ApiError> {
    let filter = query.into_filter()?;
    let card = state.catalog.pick_random(&filter)?;
    Ok(ApiResponse::ok(card.clone()))
}

/// POST /api/cards/draw
async fn draw_card(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<DrawRequest>,
) -> Result<ApiResponse<DrawnCard>, ApiError> {
    let (colors, filter) = request.into_parts();
    let drawn = state.catalog.draw(&colors, &filter)?;
    debug!("Drew card {} with {} color(s)", drawn.card.id, drawn.assigned_colors.len());
    Ok(ApiResponse::ok(drawn))
}

/// GET /api/cards/stats
async fn stats(State(state): State<AppState>) -> ApiResponse<CatalogStats> {
    ApiResponse::ok(state.catalog.stats())
}
