//! Handle to one connected peer.
//!
//! A [`Peer`] is cheap to clone and shared between the hub's membership
//! map, the connection's read and write loops, and any broadcaster holding
//! a snapshot. It exposes only two capabilities to the outside: pushing a
//! payload onto the peer's bounded outbound queue and raising the peer's
//! disconnect signal.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use axum::body::Bytes;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

use crate::domain::PeerId;

/// Process-wide source of peer serial numbers.
static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

/// One entry in a peer's outbound queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Written as a text frame when the bytes are valid UTF-8, as a binary
    /// frame otherwise. Hub payloads always take this form.
    Text(Bytes),
    /// Written as a binary frame.
    Binary(Bytes),
}

impl Outbound {
    /// Raw bytes of the entry.
    #[must_use]
    pub fn payload(&self) -> &Bytes {
        match self {
            Self::Text(bytes) | Self::Binary(bytes) => bytes,
        }
    }
}

impl From<Bytes> for Outbound {
    fn from(payload: Bytes) -> Self {
        Self::Text(payload)
    }
}

/// Result of a non-blocking enqueue onto a peer's outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The payload was queued.
    Queued,
    /// The queue was full and the payload was dropped for this peer.
    Full {
        /// Drops in a row, including this one, since the last successful
        /// enqueue.
        consecutive: u32,
    },
    /// The peer's write loop is gone; nothing will ever drain the queue.
    Closed,
}

/// Shared handle to a connected peer.
#[derive(Debug, Clone)]
pub struct Peer {
    inner: Arc<PeerInner>,
}

#[derive(Debug)]
struct PeerInner {
    id: PeerId,
    serial: u64,
    outbound: mpsc::Sender<Outbound>,
    disconnect: CancellationToken,
    consecutive_drops: AtomicU32,
    total_drops: AtomicU64,
    connected_at: Instant,
}

impl Peer {
    /// Creates a peer handle and the receiving end of its outbound queue.
    ///
    /// The receiver belongs to the peer's write loop. A `capacity` of zero
    /// is raised to one.
    #[must_use]
    pub fn new(id: PeerId, capacity: usize) -> (Self, mpsc::Receiver<Outbound>) {
        let (outbound, rx) = mpsc::channel(capacity.max(1));
        let peer = Self {
            inner: Arc::new(PeerInner {
                id,
                serial: NEXT_SERIAL.fetch_add(1, Ordering::Relaxed),
                outbound,
                disconnect: CancellationToken::new(),
                consecutive_drops: AtomicU32::new(0),
                total_drops: AtomicU64::new(0),
                connected_at: Instant::now(),
            }),
        };
        (peer, rx)
    }

    /// Returns the peer's identifier.
    #[must_use]
    pub fn id(&self) -> &PeerId {
        &self.inner.id
    }

    /// Returns the process-unique serial number of this connection.
    #[must_use]
    pub fn serial(&self) -> u64 {
        self.inner.serial
    }

    /// Returns `true` if both handles refer to the same connection.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        self.inner.serial == other.inner.serial
    }

    /// Pushes a payload without waiting.
    ///
    /// A full queue drops the payload and bumps the drop counters; a
    /// successful enqueue resets the consecutive counter.
    pub fn try_enqueue(&self, payload: impl Into<Outbound>) -> EnqueueOutcome {
        match self.inner.outbound.try_send(payload.into()) {
            Ok(()) => {
                self.inner.consecutive_drops.store(0, Ordering::Relaxed);
                EnqueueOutcome::Queued
            }
            Err(TrySendError::Full(_)) => {
                let _ = self.inner.total_drops.fetch_add(1, Ordering::Relaxed);
                let consecutive = self
                    .inner
                    .consecutive_drops
                    .fetch_add(1, Ordering::Relaxed)
                    .saturating_add(1);
                EnqueueOutcome::Full { consecutive }
            }
            Err(TrySendError::Closed(_)) => EnqueueOutcome::Closed,
        }
    }

    /// Pushes a payload, waiting for a free slot.
    ///
    /// Returns `false` if the peer was disconnected before the payload
    /// could be queued.
    pub async fn enqueue(&self, payload: impl Into<Outbound>) -> bool {
        tokio::select! {
            sent = self.inner.outbound.send(payload.into()) => sent.is_ok(),
            () = self.inner.disconnect.cancelled() => false,
        }
    }

    /// Raises the disconnect signal. Both I/O loops observe it and exit.
    ///
    /// Idempotent.
    pub fn close(&self) {
        self.inner.disconnect.cancel();
    }

    /// Returns `true` once [`Peer::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.disconnect.is_cancelled()
    }

    /// Completes when the disconnect signal is raised.
    pub async fn closed(&self) {
        self.inner.disconnect.cancelled().await;
    }

    /// Drops in a row since the last successful enqueue.
    #[must_use]
    pub fn consecutive_drops(&self) -> u32 {
        self.inner.consecutive_drops.load(Ordering::Relaxed)
    }

    /// Total payloads dropped for this peer because its queue was full.
    #[must_use]
    pub fn total_drops(&self) -> u64 {
        self.inner.total_drops.load(Ordering::Relaxed)
    }

    /// Connection age.
    #[must_use]
    pub fn age(&self) -> Duration {
        self.inner.connected_at.elapsed()
    }
}
