//! Feed DTOs for create and list operations.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::Feed;

/// Request body for `POST /feeds`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateFeedRequest {
    /// Short headline; must not be blank.
    pub title: String,
    /// Free-form body text.
    #[serde(default)]
    pub description: String,
}

/// Paginated list response for `GET /feeds`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeedListResponse {
    /// Feeds on the requested page, oldest first.
    pub data: Vec<Feed>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
