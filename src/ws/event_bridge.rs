//! Event bridge: turns `CreatedFeed` bus notifications into WebSocket
//! broadcasts through the [`Hub`].

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::messages::WsMessage;
use crate::config::BridgeMode;
use crate::error::PusherError;
use crate::events::{CreatedFeedHandler, CreatedFeedMessage, EventStore, Subscription};
use crate::hub::{BroadcastReport, Hub};

/// Bridges bus notifications to connected peers.
///
/// Does not deduplicate: a notification redelivered by the bus is
/// broadcast again.
#[derive(Debug, Clone)]
pub struct EventBridge {
    hub: Hub,
}

/// Keeps a running bridge alive. Dropping it stops a callback bridge; a
/// queue bridge stops when the store closes.
#[derive(Debug)]
pub enum BridgeHandle {
    /// Callback-style subscription.
    Callback(Subscription),
    /// Task polling a queue-style subscription.
    Queue(JoinHandle<()>),
}

impl EventBridge {
    /// Creates a bridge broadcasting through `hub`.
    #[must_use]
    pub fn new(hub: Hub) -> Self {
        Self { hub }
    }

    /// Translates one notification and broadcasts it to every peer.
    ///
    /// Returns `None` if the notification could not be encoded; the
    /// failure is logged and affects only this notification.
    pub fn forward(&self, event: &CreatedFeedMessage) -> Option<BroadcastReport> {
        let payload = match WsMessage::created_feed(event).and_then(|msg| msg.to_payload()) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(feed_id = %event.id, error = %e, "failed to encode created feed");
                return None;
            }
        };
        let report = self.hub.broadcast(&payload, None);
        debug!(
            feed_id = %event.id,
            recipients = report.recipients,
            delivered = report.delivered,
            "bridged created feed"
        );
        Some(report)
    }

    /// Subscribes to `store` in the given style and starts forwarding.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the subscription cannot be set up.
    pub async fn attach(
        &self,
        store: &dyn EventStore,
        mode: BridgeMode,
    ) -> Result<BridgeHandle, PusherError> {
        let handle = match mode {
            BridgeMode::Callback => BridgeHandle::Callback(self.start_callback(store).await?),
            BridgeMode::Queue => {
                let queue = store.subscribe_created_feed().await?;
                BridgeHandle::Queue(tokio::spawn(self.clone().run_queue(queue)))
            }
        };
        info!(?mode, "event bridge attached");
        Ok(handle)
    }

    /// Forwards notifications from a callback subscription.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the subscription cannot be set up.
    pub async fn start_callback(&self, store: &dyn EventStore) -> Result<Subscription, PusherError> {
        let bridge = self.clone();
        let handler: CreatedFeedHandler = Box::new(move |event| {
            let _ = bridge.forward(&event);
        });
        store.on_created_feed(handler).await
    }

    /// Forwards notifications from a queue subscription until it ends.
    #[tracing::instrument(skip_all, name = "event_bridge")]
    pub async fn run_queue(self, mut queue: mpsc::Receiver<CreatedFeedMessage>) {
        while let Some(event) = queue.recv().await {
            let _ = self.forward(&event);
        }
        info!("event bridge: subscription closed, exiting");
    }
}
