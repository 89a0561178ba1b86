//! Search read side: a full-text index of feeds kept up to date from the
//! event bus.
//!
//! [`SearchRepository`] is the index capability. [`InMemorySearchRepository`]
//! implements it in process memory; [`SearchProjection`] feeds it from
//! `CreatedFeed` notifications.

pub mod memory;
pub mod projection;

use std::fmt;

use async_trait::async_trait;

use crate::domain::Feed;
use crate::error::PusherError;

pub use memory::InMemorySearchRepository;
pub use projection::SearchProjection;

/// Index/query store for projected feeds.
#[async_trait]
pub trait SearchRepository: Send + Sync + fmt::Debug {
    /// Adds `feed` to the index, replacing any document with the same id.
    async fn index_feed(&self, feed: &Feed) -> Result<(), PusherError>;

    /// Returns feeds matching `query`, best match first.
    async fn search_feeds(&self, query: &str) -> Result<Vec<Feed>, PusherError>;

    /// Number of indexed documents.
    async fn count(&self) -> Result<u64, PusherError>;
}
