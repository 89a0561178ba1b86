//! Axum WebSocket upgrade handler.

use std::net::SocketAddr;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;
use futures_util::StreamExt;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::domain::PeerId;

/// `GET /ws`: Upgrade HTTP connection to WebSocket and join the hub.
///
/// The peer is registered before either I/O loop starts, so its welcome
/// message is the first frame it receives.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let hub = state.hub;

    ws.on_upgrade(move |socket| async move {
        let (peer, outbound_rx) = hub.new_peer(PeerId::from_remote_addr(remote));
        hub.register(peer.clone()).await;

        let (sink, stream) = socket.split();
        run_connection(hub, peer, outbound_rx, sink, stream).await;
    })
}
