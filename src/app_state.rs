//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::hub::Hub;
use crate::service::{FeedService, SearchService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Connection hub every WebSocket client joins.
    pub hub: Hub,
    /// Feed service for the write side.
    pub feed_service: Arc<FeedService>,
    /// Search service for the read side.
    pub search_service: Arc<SearchService>,
}
