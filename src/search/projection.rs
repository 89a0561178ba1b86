//! Projection of `CreatedFeed` notifications into the search index.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::SearchRepository;
use crate::domain::Feed;
use crate::error::PusherError;
use crate::events::{CreatedFeedHandler, CreatedFeedMessage, EventStore, Subscription};

/// Keeps a [`SearchRepository`] in step with the event bus.
///
/// Notifications are indexed one at a time in arrival order. Indexing is
/// an upsert, so a redelivered notification is harmless.
#[derive(Debug, Clone)]
pub struct SearchProjection {
    index: Arc<dyn SearchRepository>,
}

impl SearchProjection {
    /// Creates a projection writing into `index`.
    #[must_use]
    pub fn new(index: Arc<dyn SearchRepository>) -> Self {
        Self { index }
    }

    /// Indexes one notification and reports whether it was stored.
    /// Failures are logged and skipped.
    pub async fn project(&self, event: CreatedFeedMessage) -> bool {
        let feed = Feed {
            id: event.id,
            title: event.title,
            description: event.description,
            created_at: event.created_at,
        };
        match self.index.index_feed(&feed).await {
            Ok(()) => {
                debug!(feed_id = %feed.id, "feed indexed");
                true
            }
            Err(e) => {
                warn!(feed_id = %feed.id, error = %e, "failed to index feed");
                false
            }
        }
    }

    /// Subscribes to `store` and indexes every notification until the
    /// returned [`Subscription`] is dropped or the store closes.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the subscription cannot be set up.
    pub async fn attach(&self, store: &dyn EventStore) -> Result<Subscription, PusherError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<CreatedFeedMessage>();
        let handler: CreatedFeedHandler = Box::new(move |event| {
            let _ = tx.send(event);
        });
        let subscription = store.on_created_feed(handler).await?;

        let projection = self.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let _ = projection.project(event).await;
            }
            debug!("search projection stopped");
        });
        Ok(subscription)
    }
}
