//! Feed record produced by the write side.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A persisted feed entry.
///
/// Immutable once created: the write side assigns `id` and `created_at`,
/// stores the record, then publishes a `CreatedFeed` notification for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Feed {
    /// Server-generated identifier (UUID v4 string).
    pub id: String,
    /// Short headline.
    pub title: String,
    /// Free-form body text.
    pub description: String,
    /// Creation instant in UTC.
    pub created_at: DateTime<Utc>,
}

impl Feed {
    /// Creates a new feed with a fresh identifier stamped at the current time.
    ///
    /// The timestamp is truncated to microseconds, the precision PostgreSQL
    /// `TIMESTAMPTZ` stores, so a stored feed reads back unchanged.
    #[must_use]
    pub fn new(title: String, description: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            description,
            created_at: Utc::now().trunc_subsecs(6),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_feeds_get_unique_ids() {
        let a = Feed::new("a".to_string(), String::new());
        let b = Feed::new("a".to_string(), String::new());
        assert_ne!(a.id, b.id);
        assert!(a.created_at <= b.created_at);
    }

    #[test]
    fn created_at_has_microsecond_precision() {
        let feed = Feed::new("t".to_string(), String::new());
        assert_eq!(feed.created_at.timestamp_subsec_nanos() % 1_000, 0);
    }
}
