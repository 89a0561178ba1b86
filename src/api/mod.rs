//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; `/health` and `/ws`
//! live at the root.

pub mod dto;
pub mod handlers;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// OpenAPI document for the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "feed-pusher", description = "Feed creation with real-time WebSocket fan-out"),
    paths(
        handlers::feed::create_feed,
        handlers::feed::list_feeds,
        handlers::feed::get_feed,
        handlers::search::search_feeds,
        handlers::search::reindex,
        handlers::system::health_handler,
    ),
    components(schemas(
        crate::domain::Feed,
        dto::CreateFeedRequest,
        dto::FeedListResponse,
        dto::PaginationMeta,
        dto::ReindexResponse,
        handlers::system::HealthResponse,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    )),
    tags(
        (name = "Feeds", description = "Feed creation and listing"),
        (name = "Search", description = "Full-text search over created feeds"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}

/// Builds the full application: REST routes, the `/ws` upgrade endpoint,
/// HTTP tracing and permissive CORS, bound to `state`.
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()`;
/// the WebSocket handler derives peer identity from the remote address.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_feed_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/feeds"));
        assert!(doc.paths.paths.contains_key("/api/v1/feeds/{id}"));
        assert!(doc.paths.paths.contains_key("/api/v1/search"));
        assert!(doc.paths.paths.contains_key("/api/v1/reindex"));
        assert!(doc.paths.paths.contains_key("/health"));
    }
}
