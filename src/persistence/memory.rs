//! In-memory feed repository.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::FeedRepository;
use crate::domain::Feed;
use crate::error::PusherError;

/// Feed store backed by a `Vec` behind a [`tokio::sync::RwLock`].
#[derive(Debug, Default)]
pub struct InMemoryFeedRepository {
    feeds: RwLock<Vec<Feed>>,
}

impl InMemoryFeedRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeedRepository for InMemoryFeedRepository {
    async fn insert_feed(&self, feed: &Feed) -> Result<(), PusherError> {
        let mut feeds = self.feeds.write().await;
        if feeds.iter().any(|existing| existing.id == feed.id) {
            return Err(PusherError::InvalidRequest(format!(
                "feed {} already exists",
                feed.id
            )));
        }
        feeds.push(feed.clone());
        Ok(())
    }

    async fn find_feed(&self, id: &str) -> Result<Option<Feed>, PusherError> {
        Ok(self.feeds.read().await.iter().find(|feed| feed.id == id).cloned())
    }

    async fn list_feeds(&self) -> Result<Vec<Feed>, PusherError> {
        let mut feeds = self.feeds.read().await.clone();
        feeds.sort_by_key(|feed| feed.created_at);
        Ok(feeds)
    }
}
