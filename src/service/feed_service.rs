//! Feed service: creates and lists feeds and emits `CreatedFeed` events.

use std::sync::Arc;

use crate::domain::Feed;
use crate::error::PusherError;
use crate::events::EventStore;
use crate::persistence::FeedRepository;

/// Maximum accepted title length, in characters.
pub const MAX_TITLE_LEN: usize = 200;

/// Write side of the feed system.
///
/// Every creation follows the pattern: validate → persist → publish →
/// return the stored record.
#[derive(Debug, Clone)]
pub struct FeedService {
    repository: Arc<dyn FeedRepository>,
    events: Arc<dyn EventStore>,
}

impl FeedService {
    /// Creates a new `FeedService`.
    #[must_use]
    pub fn new(repository: Arc<dyn FeedRepository>, events: Arc<dyn EventStore>) -> Self {
        Self { repository, events }
    }

    /// Creates, stores and announces a new feed.
    ///
    /// A failure to publish the notification is logged; the stored feed is
    /// still returned.
    ///
    /// # Errors
    ///
    /// Returns [`PusherError::InvalidRequest`] for an empty or oversized
    /// title, or the repository's error if the feed cannot be stored.
    pub async fn create_feed(
        &self,
        title: &str,
        description: &str,
    ) -> Result<Feed, PusherError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(PusherError::InvalidRequest(
                "title must not be empty".to_string(),
            ));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(PusherError::InvalidRequest(format!(
                "title exceeds {MAX_TITLE_LEN} characters"
            )));
        }

        let feed = Feed::new(title.to_string(), description.to_string());
        self.repository.insert_feed(&feed).await?;

        if let Err(e) = self.events.publish_created_feed(&feed).await {
            tracing::warn!(feed_id = %feed.id, error = %e, "failed to publish created feed");
        }

        tracing::info!(feed_id = %feed.id, "feed created");
        Ok(feed)
    }

    /// Returns the feed with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`PusherError::FeedNotFound`] if no such feed exists, or the
    /// repository's error on read failure.
    pub async fn get_feed(&self, id: &str) -> Result<Feed, PusherError> {
        self.repository
            .find_feed(id)
            .await?
            .ok_or_else(|| PusherError::FeedNotFound(id.to_string()))
    }

    /// Returns every stored feed, oldest first.
    ///
    /// # Errors
    ///
    /// Returns the repository's error on read failure.
    pub async fn list_feeds(&self) -> Result<Vec<Feed>, PusherError> {
        self.repository.list_feeds().await
    }
}
