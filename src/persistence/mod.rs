//! Persistence layer: durable storage of feed records.
//!
//! Provides the [`FeedRepository`] trait. [`PostgresFeedRepository`]
//! uses `sqlx::PgPool` for async PostgreSQL access;
//! [`InMemoryFeedRepository`] keeps records in process memory and is used
//! when persistence is disabled.

pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;

use crate::domain::Feed;
use crate::error::PusherError;

pub use memory::InMemoryFeedRepository;
pub use postgres::PostgresFeedRepository;

/// Create/list store for feed records.
#[async_trait]
pub trait FeedRepository: Send + Sync + fmt::Debug {
    /// Stores a new feed.
    async fn insert_feed(&self, feed: &Feed) -> Result<(), PusherError>;

    /// Looks up one feed by id.
    async fn find_feed(&self, id: &str) -> Result<Option<Feed>, PusherError>;

    /// Returns all feeds, oldest first.
    async fn list_feeds(&self) -> Result<Vec<Feed>, PusherError>;
}
