//! Search service: queries the search index and rebuilds it from the feed
//! store.

use std::sync::Arc;

use crate::domain::Feed;
use crate::error::PusherError;
use crate::persistence::FeedRepository;
use crate::search::SearchRepository;

/// Outcome of a full reindex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReindexReport {
    /// Feeds read from the store.
    pub total_feeds: usize,
    /// Feeds successfully written to the index.
    pub indexed_count: usize,
}

/// Read side of the feed system.
#[derive(Debug, Clone)]
pub struct SearchService {
    index: Arc<dyn SearchRepository>,
    feeds: Arc<dyn FeedRepository>,
}

impl SearchService {
    /// Creates a new `SearchService`.
    #[must_use]
    pub fn new(index: Arc<dyn SearchRepository>, feeds: Arc<dyn FeedRepository>) -> Self {
        Self { index, feeds }
    }

    /// Returns feeds matching `query`, best match first.
    ///
    /// # Errors
    ///
    /// Returns [`PusherError::InvalidRequest`] for a blank query, or the
    /// index's error on failure.
    pub async fn search(&self, query: &str) -> Result<Vec<Feed>, PusherError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(PusherError::InvalidRequest(
                "query parameter q is required".to_string(),
            ));
        }
        self.index.search_feeds(query).await
    }

    /// Re-indexes every stored feed.
    ///
    /// Feeds that fail to index are logged and counted out of
    /// `indexed_count`; the rest are still indexed.
    ///
    /// # Errors
    ///
    /// Returns the feed store's error if the feeds cannot be listed.
    pub async fn reindex(&self) -> Result<ReindexReport, PusherError> {
        let feeds = self.feeds.list_feeds().await?;
        let mut indexed_count = 0;
        for feed in &feeds {
            match self.index.index_feed(feed).await {
                Ok(()) => indexed_count += 1,
                Err(e) => {
                    tracing::warn!(feed_id = %feed.id, error = %e, "failed to reindex feed");
                }
            }
        }
        tracing::info!(total = feeds.len(), indexed = indexed_count, "reindex complete");
        Ok(ReindexReport {
            total_feeds: feeds.len(),
            indexed_count,
        })
    }

    /// Number of indexed documents.
    ///
    /// # Errors
    ///
    /// Returns the index's error on failure.
    pub async fn count(&self) -> Result<u64, PusherError> {
        self.index.count().await
    }
}
