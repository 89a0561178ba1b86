//! Feed handlers: create and list.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{CreateFeedRequest, FeedListResponse, PaginationParams};
use crate::app_state::AppState;
use crate::domain::Feed;
use crate::error::{ErrorResponse, PusherError};

/// `POST /feeds`: Create a feed and announce it to connected clients.
///
/// # Errors
///
/// Returns [`PusherError::InvalidRequest`] for a blank title, or a
/// persistence error if the feed cannot be stored.
#[utoipa::path(
    post,
    path = "/api/v1/feeds",
    tag = "Feeds",
    summary = "Create a feed",
    description = "Stores a new feed and publishes a CreatedFeed event, which is pushed to every connected WebSocket client.",
    request_body = CreateFeedRequest,
    responses(
        (status = 201, description = "Feed created", body = Feed),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn create_feed(
    State(state): State<AppState>,
    Json(req): Json<CreateFeedRequest>,
) -> Result<impl IntoResponse, PusherError> {
    let feed = state
        .feed_service
        .create_feed(&req.title, &req.description)
        .await?;
    Ok((StatusCode::CREATED, Json(feed)))
}

/// `GET /feeds`: List feeds with pagination.
///
/// # Errors
///
/// Returns a persistence error if the feeds cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/feeds",
    tag = "Feeds",
    summary = "List feeds",
    description = "Returns a paginated list of stored feeds, oldest first.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated feed list", body = FeedListResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn list_feeds(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, PusherError> {
    let feeds = state.feed_service.list_feeds().await?;
    let (data, pagination) = params.paginate(feeds);
    Ok(Json(FeedListResponse { data, pagination }))
}

/// `GET /feeds/:id`: Get a single feed.
///
/// # Errors
///
/// Returns [`PusherError::FeedNotFound`] if the feed does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/feeds/{id}",
    tag = "Feeds",
    summary = "Get a feed",
    description = "Returns a single stored feed by id.",
    params(
        ("id" = String, Path, description = "Feed id"),
    ),
    responses(
        (status = 200, description = "Feed", body = Feed),
        (status = 404, description = "Feed not found", body = ErrorResponse),
    )
)]
pub async fn get_feed(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, PusherError> {
    let feed = state.feed_service.get_feed(&id).await?;
    Ok(Json(feed))
}

/// Feed routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/feeds", post(create_feed).get(list_feeds))
        .route("/feeds/{id}", get(get_feed))
}
