//! In-process event store.
//!
//! [`InMemoryEventStore`] keeps one [`tokio::sync::broadcast`] channel per
//! subject and carries encoded frames on it, so subscribers go through the
//! same decode path a network bus would require. When a channel's ring
//! buffer is full the oldest frames are dropped for lagging receivers.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::body::Bytes;
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use super::store::{CreatedFeedHandler, EventStore, SUBSCRIPTION_QUEUE_CAPACITY, Subscription};
use super::{CREATED_FEED_SUBJECT, CreatedFeedMessage};
use crate::domain::Feed;
use crate::error::PusherError;

/// Subject-keyed broadcast bus living inside the process.
#[derive(Debug)]
pub struct InMemoryEventStore {
    capacity: usize,
    /// `None` once the store is closed.
    subjects: Mutex<Option<HashMap<String, broadcast::Sender<Bytes>>>>,
}

impl InMemoryEventStore {
    /// Creates a store whose per-subject channels hold `capacity` frames.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            subjects: Mutex::new(Some(HashMap::new())),
        }
    }

    fn sender(&self, subject: &str) -> Result<broadcast::Sender<Bytes>, PusherError> {
        let mut guard = self.subjects.lock();
        let subjects = guard
            .as_mut()
            .ok_or_else(|| PusherError::EventBus("event store is closed".to_string()))?;
        let sender = subjects
            .entry(subject.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        Ok(sender.clone())
    }

    /// Publishes a raw frame on `subject`.
    ///
    /// Returns the number of subscribers that will see the frame. A frame
    /// published with no subscribers is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`PusherError::EventBus`] if the store is closed.
    pub fn publish_frame(&self, subject: &str, frame: Bytes) -> Result<usize, PusherError> {
        let sender = self.sender(subject)?;
        Ok(sender.send(frame).unwrap_or(0))
    }

    /// Subscribes to raw frames on `subject`.
    ///
    /// # Errors
    ///
    /// Returns [`PusherError::EventBus`] if the store is closed.
    pub fn subscribe_frames(&self, subject: &str) -> Result<broadcast::Receiver<Bytes>, PusherError> {
        Ok(self.sender(subject)?.subscribe())
    }

    /// Returns the number of live subscribers on `subject`.
    #[must_use]
    pub fn receiver_count(&self, subject: &str) -> usize {
        self.subjects
            .lock()
            .as_ref()
            .and_then(|subjects| subjects.get(subject))
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

/// Waits for the next decodable `CreatedFeed` frame.
///
/// Returns `None` once the channel is closed.
async fn next_created_feed(rx: &mut broadcast::Receiver<Bytes>) -> Option<CreatedFeedMessage> {
    loop {
        match rx.recv().await {
            Ok(frame) => match CreatedFeedMessage::decode(&frame) {
                Ok(message) => return Some(message),
                Err(e) => warn!(error = %e, "dropping undecodable CreatedFeed frame"),
            },
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(lagged = n, "subscriber lagged behind event store");
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn publish_created_feed(&self, feed: &Feed) -> Result<(), PusherError> {
        let frame = CreatedFeedMessage::from(feed).encode()?;
        let receivers = self.publish_frame(CREATED_FEED_SUBJECT, Bytes::from(frame))?;
        debug!(feed_id = %feed.id, receivers, "published CreatedFeed");
        Ok(())
    }

    async fn on_created_feed(
        &self,
        handler: CreatedFeedHandler,
    ) -> Result<Subscription, PusherError> {
        let mut rx = self.subscribe_frames(CREATED_FEED_SUBJECT)?;
        let task = tokio::spawn(async move {
            while let Some(message) = next_created_feed(&mut rx).await {
                handler(message);
            }
            debug!("CreatedFeed callback subscription ended");
        });
        Ok(Subscription::new(CREATED_FEED_SUBJECT, task))
    }

    async fn subscribe_created_feed(
        &self,
    ) -> Result<mpsc::Receiver<CreatedFeedMessage>, PusherError> {
        let mut rx = self.subscribe_frames(CREATED_FEED_SUBJECT)?;
        let (tx, queue) = mpsc::channel(SUBSCRIPTION_QUEUE_CAPACITY);
        tokio::spawn(async move {
            while let Some(message) = next_created_feed(&mut rx).await {
                if tx.send(message).await.is_err() {
                    break;
                }
            }
            debug!("CreatedFeed queue subscription ended");
        });
        Ok(queue)
    }

    async fn close(&self) -> Result<(), PusherError> {
        // Dropping the senders ends every subscription once drained.
        if self.subjects.lock().take().is_some() {
            debug!("event store closed");
        }
        Ok(())
    }
}
