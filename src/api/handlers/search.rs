//! Search handlers: query and reindex.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{ReindexResponse, SearchParams};
use crate::app_state::AppState;
use crate::domain::Feed;
use crate::error::{ErrorResponse, PusherError};

/// `GET /search`: Full-text search over indexed feeds.
///
/// # Errors
///
/// Returns [`PusherError::InvalidRequest`] when `q` is missing or blank.
#[utoipa::path(
    get,
    path = "/api/v1/search",
    tag = "Search",
    summary = "Search feeds",
    description = "Returns indexed feeds whose title or description contains any of the query terms, best match first.",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching feeds", body = Vec<Feed>),
        (status = 400, description = "Missing query", body = ErrorResponse),
        (status = 500, description = "Index failure", body = ErrorResponse),
    )
)]
pub async fn search_feeds(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, PusherError> {
    let query = params.q.unwrap_or_default();
    let feeds = state.search_service.search(&query).await?;
    Ok(Json(feeds))
}

/// `POST /reindex`: Rebuild the search index from the feed store.
///
/// # Errors
///
/// Returns a persistence error if the stored feeds cannot be read.
#[utoipa::path(
    post,
    path = "/api/v1/reindex",
    tag = "Search",
    summary = "Reindex feeds",
    description = "Re-indexes every stored feed. Feeds that fail to index are skipped and left out of indexed_count.",
    responses(
        (status = 200, description = "Reindex finished", body = ReindexResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn reindex(State(state): State<AppState>) -> Result<impl IntoResponse, PusherError> {
    let report = state.search_service.reindex().await?;
    Ok(Json(ReindexResponse {
        message: "reindex completed".to_string(),
        total_feeds: report.total_feeds,
        indexed_count: report.indexed_count,
        timestamp: Utc::now().to_rfc3339(),
    }))
}

/// Search routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(search_feeds))
        .route("/reindex", post(reindex))
}
