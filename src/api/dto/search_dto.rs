//! Search DTOs for query and reindex operations.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for `GET /search`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Search terms, matched against title and description.
    pub q: Option<String>,
}

/// Response body for `POST /reindex`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReindexResponse {
    /// Human-readable summary.
    pub message: String,
    /// Feeds read from the store.
    pub total_feeds: usize,
    /// Feeds written to the index.
    pub indexed_count: usize,
    /// Completion time (RFC 3339).
    pub timestamp: String,
}
