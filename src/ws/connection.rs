//! Per-connection read and write loops.
//!
//! A registered peer runs two concurrent loops that share the peer's
//! outbound queue and disconnect signal:
//!
//! - the **read loop** echoes data frames back onto the outbound queue and
//!   unregisters the peer once the connection ends;
//! - the **write loop** drains the outbound queue and sends a keepalive
//!   ping on every tick, closing the peer on the first write failure.
//!
//! Every write races the disconnect signal, so closing a peer ends its
//! loops even when the socket has stopped accepting data.

use std::fmt::Display;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{Message, Utf8Bytes};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

use crate::hub::{Hub, Outbound, Peer};

/// Body of keepalive ping frames.
const KEEPALIVE_PAYLOAD: &[u8] = b"keepalive";

/// How long the closing handshake may take once the peer is closed.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Runs both loops for an already registered peer until the connection
/// ends, then unregisters it.
///
/// The write loop runs on its own task; the read loop runs on the
/// caller's.
#[tracing::instrument(skip_all, fields(peer_id = %peer.id()))]
pub async fn run_connection<S, R>(
    hub: Hub,
    peer: Peer,
    outbound_rx: mpsc::Receiver<Outbound>,
    sink: S,
    stream: R,
) where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: Display,
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let keepalive = hub.config().keepalive_interval;
    let writer = tokio::spawn(write_loop(peer.clone(), outbound_rx, sink, keepalive));

    read_loop(&peer, stream).await;
    hub.unregister(&peer).await;

    if let Err(e) = writer.await {
        debug!(error = %e, "write task ended abnormally");
    }
    debug!(age_ms = peer.age().as_millis(), "connection closed");
}

/// Reads frames until the stream ends, fails, or the peer is closed.
async fn read_loop<R>(peer: &Peer, mut stream: R)
where
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    loop {
        let frame = tokio::select! {
            () = peer.closed() => break,
            frame = stream.next() => frame,
        };

        let echo = match frame {
            Some(Ok(Message::Text(text))) => Outbound::Text(Bytes::from(text)),
            Some(Ok(Message::Binary(data))) => Outbound::Binary(data),
            Some(Ok(Message::Pong(_))) => {
                trace!("pong received");
                continue;
            }
            Some(Ok(Message::Ping(_))) => continue,
            Some(Ok(Message::Close(_))) | None => {
                debug!("peer closed connection");
                break;
            }
            Some(Err(e)) => {
                debug!(error = %e, "read failed");
                break;
            }
        };

        trace!(len = echo.payload().len(), "echoing frame");
        if !peer.enqueue(echo).await {
            break;
        }
    }
}

/// Writes queued payloads and keepalive pings until a write fails or the
/// peer is closed. Always leaves the peer closed.
async fn write_loop<S>(
    peer: Peer,
    mut outbound_rx: mpsc::Receiver<Outbound>,
    mut sink: S,
    keepalive: Duration,
) where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let mut ticker = tokio::time::interval(keepalive);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    let _ = ticker.tick().await;

    loop {
        tokio::select! {
            () = peer.closed() => break,
            frame = outbound_rx.recv() => {
                let Some(frame) = frame else { break };
                if !send_frame(&peer, &mut sink, data_frame(frame)).await {
                    break;
                }
            }
            _ = ticker.tick() => {
                let ping = Message::Ping(Bytes::from_static(KEEPALIVE_PAYLOAD));
                if !send_frame(&peer, &mut sink, ping).await {
                    break;
                }
                trace!("keepalive sent");
            }
        }
    }

    peer.close();
    let closing = async {
        let _ = sink.send(Message::Close(None)).await;
        let _ = sink.close().await;
    };
    if tokio::time::timeout(CLOSE_GRACE, closing).await.is_err() {
        debug!("closing handshake timed out");
    }
}

/// Writes one frame unless the peer is closed first.
///
/// Returns `false` if the frame was not written.
async fn send_frame<S>(peer: &Peer, sink: &mut S, frame: Message) -> bool
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    tokio::select! {
        () = peer.closed() => false,
        sent = sink.send(frame) => match sent {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "write failed");
                false
            }
        },
    }
}

/// Turns a queued entry into a wire frame without copying the payload.
fn data_frame(frame: Outbound) -> Message {
    match frame {
        Outbound::Text(payload) => match Utf8Bytes::try_from(payload.clone()) {
            Ok(text) => Message::Text(text),
            Err(_) => Message::Binary(payload),
        },
        Outbound::Binary(payload) => Message::Binary(payload),
    }
}
