//! Connection registry and dispatcher.
//!
//! The [`Hub`] owns the set of live peers. Membership changes are
//! submitted as requests to a single control task ([`HubControl::run`]),
//! which applies them under the membership lock one at a time.
//! [`Hub::broadcast`] snapshots the membership under the same lock and
//! then enqueues onto each peer without holding it.
//!
//! # Backpressure
//!
//! Enqueueing never waits. When a peer's outbound queue is full the
//! payload is dropped for that peer only. A peer that has dropped
//! [`HubConfig::slow_peer_max_drops`] broadcasts in a row is closed and
//! unregistered. A peer whose write loop has already exited is
//! unregistered on the first broadcast that notices it.

pub mod peer;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub use peer::{EnqueueOutcome, Outbound, Peer};

use crate::domain::PeerId;
use crate::ws::messages::WsMessage;

/// Tunables shared by the hub and the connections it manages.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Slots in each peer's outbound queue.
    pub outbound_queue_capacity: usize,
    /// Interval between keepalive pings written by each peer's write loop.
    pub keepalive_interval: Duration,
    /// Consecutive dropped broadcasts after which a peer is evicted.
    pub slow_peer_max_drops: u32,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            outbound_queue_capacity: 256,
            keepalive_interval: Duration::from_secs(30),
            slow_peer_max_drops: 8,
        }
    }
}

/// Per-call outcome of [`Hub::broadcast`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Peers in the snapshot after applying the exclusion.
    pub recipients: usize,
    /// Peers the payload was queued for.
    pub delivered: usize,
    /// Peers whose queue was full.
    pub dropped: usize,
    /// Peers scheduled for unregistration by this call.
    pub evicted: usize,
}

#[derive(Debug)]
enum HubRequest {
    Register {
        peer: Peer,
        ack: oneshot::Sender<()>,
    },
    Unregister {
        peer: Peer,
        ack: Option<oneshot::Sender<()>>,
    },
    Shutdown {
        ack: oneshot::Sender<()>,
    },
}

#[derive(Debug)]
struct Membership {
    peers: Mutex<BTreeMap<PeerId, Peer>>,
    config: HubConfig,
}

/// Cloneable handle to the connection registry.
///
/// Created with [`Hub::new`] (which also returns the control task) or
/// [`Hub::spawn`]. Lifecycle: `new → run → shutdown`.
#[derive(Debug, Clone)]
pub struct Hub {
    membership: Arc<Membership>,
    requests: mpsc::UnboundedSender<HubRequest>,
}

/// The hub's control task. The only writer of the membership map.
#[derive(Debug)]
pub struct HubControl {
    membership: Arc<Membership>,
    requests: mpsc::UnboundedReceiver<HubRequest>,
}

impl Hub {
    /// Creates a hub handle and its not-yet-running control task.
    ///
    /// Register and unregister calls wait on the control task, so
    /// [`HubControl::run`] must be driven for the hub to make progress.
    #[must_use]
    pub fn new(config: HubConfig) -> (Self, HubControl) {
        let membership = Arc::new(Membership {
            peers: Mutex::new(BTreeMap::new()),
            config,
        });
        let (tx, rx) = mpsc::unbounded_channel();
        let hub = Self {
            membership: Arc::clone(&membership),
            requests: tx,
        };
        let control = HubControl {
            membership,
            requests: rx,
        };
        (hub, control)
    }

    /// Creates a hub and spawns its control task on the current runtime.
    #[must_use]
    pub fn spawn(config: HubConfig) -> (Self, JoinHandle<()>) {
        let (hub, control) = Self::new(config);
        let handle = tokio::spawn(control.run());
        (hub, handle)
    }

    /// Returns the hub's configuration.
    #[must_use]
    pub fn config(&self) -> &HubConfig {
        &self.membership.config
    }

    /// Creates a peer handle sized by this hub's queue capacity.
    #[must_use]
    pub fn new_peer(&self, id: PeerId) -> (Peer, mpsc::Receiver<Outbound>) {
        Peer::new(id, self.membership.config.outbound_queue_capacity)
    }

    /// Adds a peer to the membership and queues its welcome message.
    ///
    /// Returns once the control task has applied the change. If the hub
    /// has shut down the peer is closed instead.
    pub async fn register(&self, peer: Peer) {
        let (ack, done) = oneshot::channel();
        let request = HubRequest::Register {
            peer: peer.clone(),
            ack,
        };
        if self.requests.send(request).is_err() || done.await.is_err() {
            debug!(peer_id = %peer.id(), "hub stopped, closing late peer");
            peer.close();
        }
    }

    /// Removes a peer and closes its connection.
    ///
    /// Unknown or already-removed peers are ignored. Returns once the
    /// control task has applied the change.
    pub async fn unregister(&self, peer: &Peer) {
        peer.close();
        let (ack, done) = oneshot::channel();
        let request = HubRequest::Unregister {
            peer: peer.clone(),
            ack: Some(ack),
        };
        if self.requests.send(request).is_ok() {
            let _ = done.await;
        }
    }

    /// Closes a peer and queues its removal without waiting for it.
    fn evict(&self, peer: &Peer) {
        peer.close();
        let _ = self.requests.send(HubRequest::Unregister {
            peer: peer.clone(),
            ack: None,
        });
    }

    /// Enqueues `payload` onto every registered peer except `exclude`.
    ///
    /// Never waits on a peer. See the module docs for the backpressure
    /// rule applied to full queues.
    pub fn broadcast(&self, payload: &Bytes, exclude: Option<&PeerId>) -> BroadcastReport {
        let snapshot: Vec<Peer> = {
            let peers = self.membership.peers.lock();
            peers
                .values()
                .filter(|peer| exclude != Some(peer.id()))
                .cloned()
                .collect()
        };

        let max_drops = self.membership.config.slow_peer_max_drops.max(1);
        let mut report = BroadcastReport {
            recipients: snapshot.len(),
            ..BroadcastReport::default()
        };

        for peer in &snapshot {
            match peer.try_enqueue(payload.clone()) {
                EnqueueOutcome::Queued => report.delivered += 1,
                EnqueueOutcome::Full { consecutive } => {
                    report.dropped += 1;
                    if consecutive >= max_drops {
                        warn!(
                            peer_id = %peer.id(),
                            dropped = consecutive,
                            "evicting slow peer"
                        );
                        self.evict(peer);
                        report.evicted += 1;
                    } else {
                        debug!(peer_id = %peer.id(), dropped = consecutive, "peer queue full");
                    }
                }
                EnqueueOutcome::Closed => {
                    debug!(peer_id = %peer.id(), "peer write loop gone");
                    self.evict(peer);
                    report.evicted += 1;
                }
            }
        }

        debug!(
            recipients = report.recipients,
            delivered = report.delivered,
            dropped = report.dropped,
            "broadcast"
        );
        report
    }

    /// Stops the control task and closes every peer.
    ///
    /// Later registrations close the incoming peer immediately.
    pub async fn shutdown(&self) {
        let (ack, done) = oneshot::channel();
        if self.requests.send(HubRequest::Shutdown { ack }).is_ok() {
            let _ = done.await;
        }
        self.membership.close_all();
    }

    /// Number of registered peers.
    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.membership.peers.lock().len()
    }

    /// Returns `true` if a peer with this identifier is registered.
    #[must_use]
    pub fn contains(&self, id: &PeerId) -> bool {
        self.membership.peers.lock().contains_key(id)
    }

    /// Identifiers of all registered peers, in broadcast order.
    #[must_use]
    pub fn peer_ids(&self) -> Vec<PeerId> {
        self.membership.peers.lock().keys().cloned().collect()
    }
}

impl HubControl {
    /// Applies register/unregister requests until shutdown or until every
    /// [`Hub`] handle is dropped.
    #[tracing::instrument(skip_all, name = "hub")]
    pub async fn run(mut self) {
        info!("hub started");
        while let Some(request) = self.requests.recv().await {
            match request {
                HubRequest::Register { peer, ack } => {
                    self.membership.add(peer);
                    let _ = ack.send(());
                }
                HubRequest::Unregister { peer, ack } => {
                    self.membership.remove(&peer);
                    if let Some(ack) = ack {
                        let _ = ack.send(());
                    }
                }
                HubRequest::Shutdown { ack } => {
                    self.requests.close();
                    self.drain();
                    self.membership.close_all();
                    let _ = ack.send(());
                    break;
                }
            }
        }
        self.membership.close_all();
        info!("hub stopped");
    }

    /// Settles requests that arrived after shutdown began.
    fn drain(&mut self) {
        while let Ok(request) = self.requests.try_recv() {
            match request {
                HubRequest::Register { peer, .. } => peer.close(),
                HubRequest::Unregister { peer, ack } => {
                    peer.close();
                    if let Some(ack) = ack {
                        let _ = ack.send(());
                    }
                }
                HubRequest::Shutdown { ack } => {
                    let _ = ack.send(());
                }
            }
        }
    }
}

impl Membership {
    fn add(&self, peer: Peer) {
        match WsMessage::welcome(peer.id()).to_payload() {
            Ok(welcome) => {
                // Queued before the insert so no broadcast can overtake it.
                if peer.try_enqueue(welcome) != EnqueueOutcome::Queued {
                    warn!(peer_id = %peer.id(), "could not queue welcome message");
                }
            }
            Err(e) => warn!(peer_id = %peer.id(), error = %e, "failed to encode welcome"),
        }

        let (replaced, count) = {
            let mut peers = self.peers.lock();
            let replaced = peers.insert(peer.id().clone(), peer.clone());
            (replaced, peers.len())
        };
        if let Some(old) = replaced
            && !old.same_as(&peer)
        {
            warn!(
                peer_id = %peer.id(),
                stale_serial = old.serial(),
                "replacing stale peer with same id"
            );
            old.close();
        }
        info!(
            peer_id = %peer.id(),
            serial = peer.serial(),
            peers = count,
            "peer registered"
        );
    }

    fn remove(&self, peer: &Peer) {
        let (removed, count) = {
            let mut peers = self.peers.lock();
            let removed = match peers.get(peer.id()) {
                Some(current) if current.same_as(peer) => peers.remove(peer.id()),
                _ => None,
            };
            (removed, peers.len())
        };
        peer.close();
        if removed.is_some() {
            info!(
                peer_id = %peer.id(),
                serial = peer.serial(),
                peers = count,
                dropped = peer.total_drops(),
                "peer unregistered"
            );
        } else {
            debug!(peer_id = %peer.id(), "unregister of unknown peer ignored");
        }
    }

    fn close_all(&self) {
        let peers = std::mem::take(&mut *self.peers.lock());
        for peer in peers.values() {
            peer.close();
        }
        if !peers.is_empty() {
            info!(peers = peers.len(), "closed all peers");
        }
    }
}
