//! Event store capability consumed by the write side and the event bridge.

use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::CreatedFeedMessage;
use crate::domain::Feed;
use crate::error::PusherError;

/// Slots in the queue returned by [`EventStore::subscribe_created_feed`].
pub const SUBSCRIPTION_QUEUE_CAPACITY: usize = 64;

/// Callback invoked for every decoded `CreatedFeed` notification.
pub type CreatedFeedHandler = Box<dyn Fn(CreatedFeedMessage) + Send + Sync + 'static>;

/// Publish/subscribe interface for feed notifications.
///
/// Offers both a callback-style and a queue-style subscription; a caller
/// picks one per use site. Delivery is at-least-once with no ordering
/// guarantee across publishers. Frames that fail to decode are skipped
/// without ending the subscription.
#[async_trait]
pub trait EventStore: Send + Sync + fmt::Debug {
    /// Publishes a `CreatedFeed` notification for `feed`.
    async fn publish_created_feed(&self, feed: &Feed) -> Result<(), PusherError>;

    /// Invokes `handler` for every `CreatedFeed` notification until the
    /// returned [`Subscription`] is dropped or the store is closed.
    async fn on_created_feed(&self, handler: CreatedFeedHandler)
    -> Result<Subscription, PusherError>;

    /// Returns a bounded queue of decoded `CreatedFeed` notifications.
    ///
    /// The queue ends when the store is closed.
    async fn subscribe_created_feed(
        &self,
    ) -> Result<mpsc::Receiver<CreatedFeedMessage>, PusherError>;

    /// Ends all subscriptions and rejects further calls.
    async fn close(&self) -> Result<(), PusherError>;
}

/// Handle to a callback subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    subject: &'static str,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Wraps the task delivering notifications for `subject`.
    #[must_use]
    pub fn new(subject: &'static str, task: JoinHandle<()>) -> Self {
        Self {
            subject,
            task: Some(task),
        }
    }

    /// Subject this subscription listens on.
    #[must_use]
    pub fn subject(&self) -> &'static str {
        self.subject
    }

    /// Returns `true` while notifications are still being delivered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stops delivery.
    pub fn unsubscribe(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop();
    }
}
