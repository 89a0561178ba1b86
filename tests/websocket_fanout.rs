//! End-to-end WebSocket tests: welcome, fan-out, echo and disconnect.

#![allow(clippy::panic)]

mod common;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use common::{TestServer, start_server};
use feed_pusher::config::BridgeMode;
use feed_pusher::events::EventStore;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(server: &TestServer) -> Client {
    let Ok((client, _response)) = connect_async(server.ws_url()).await else {
        panic!("websocket handshake failed");
    };
    client
}

/// Next text frame, skipping control frames.
async fn next_text(client: &mut Client) -> String {
    loop {
        let next = tokio::time::timeout(Duration::from_secs(5), client.next()).await;
        let Ok(Some(Ok(msg))) = next else {
            panic!("no frame received");
        };
        match msg {
            Message::Text(text) => return text.as_str().to_string(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

async fn next_json(client: &mut Client) -> Value {
    let text = next_text(client).await;
    let Ok(value) = serde_json::from_str::<Value>(&text) else {
        panic!("frame is not json: {text}");
    };
    value
}

async fn post_feed(server: &TestServer, title: &str, description: &str) -> Value {
    let Ok(response) = reqwest::Client::new()
        .post(server.http_url("/api/v1/feeds"))
        .json(&json!({ "title": title, "description": description }))
        .send()
        .await
    else {
        panic!("POST failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let Ok(feed) = response.json::<Value>().await else {
        panic!("bad feed body");
    };
    feed
}

#[tokio::test]
async fn welcome_is_the_first_frame() {
    let server = start_server(BridgeMode::Callback).await;
    let mut client = connect(&server).await;

    let welcome = next_json(&mut client).await;
    assert_eq!(welcome["type"], "welcome");
    assert!(welcome["payload"]["peer_id"].is_string());
    server.wait_for_peers(1).await;
}

async fn created_feed_reaches_every_client(mode: BridgeMode) {
    let server = start_server(mode).await;
    let mut a = connect(&server).await;
    let mut b = connect(&server).await;
    let _ = next_json(&mut a).await;
    let _ = next_json(&mut b).await;
    server.wait_for_peers(2).await;

    let feed = post_feed(&server, "Launch", "We shipped").await;

    for client in [&mut a, &mut b] {
        let msg = next_json(client).await;
        assert_eq!(msg["type"], "created_feed");
        assert_eq!(msg["payload"]["id"], feed["id"]);
        assert_eq!(msg["payload"]["title"], "Launch");
        assert_eq!(msg["payload"]["description"], "We shipped");
        assert_eq!(msg["payload"]["created_at"], feed["created_at"]);
    }
}

#[tokio::test]
async fn created_feed_reaches_every_client_callback_mode() {
    created_feed_reaches_every_client(BridgeMode::Callback).await;
}

#[tokio::test]
async fn created_feed_reaches_every_client_queue_mode() {
    created_feed_reaches_every_client(BridgeMode::Queue).await;
}

#[tokio::test]
async fn client_text_is_echoed_to_sender_only() {
    let server = start_server(BridgeMode::Callback).await;
    let mut sender = connect(&server).await;
    let mut other = connect(&server).await;
    let _ = next_json(&mut sender).await;
    let _ = next_json(&mut other).await;
    server.wait_for_peers(2).await;

    assert!(sender.send(Message::text("hello hub".to_string())).await.is_ok());
    assert_eq!(next_text(&mut sender).await, "hello hub");

    // The other client sees the next broadcast, not the echo.
    let feed = post_feed(&server, "after echo", "").await;
    let msg = next_json(&mut other).await;
    assert_eq!(msg["payload"]["id"], feed["id"]);
}

#[tokio::test]
async fn disconnect_removes_peer() {
    let server = start_server(BridgeMode::Callback).await;
    let mut client = connect(&server).await;
    let _ = next_json(&mut client).await;
    server.wait_for_peers(1).await;

    assert!(client.close(None).await.is_ok());
    server.wait_for_peers(0).await;

    // Broadcasting with nobody connected is a no-op.
    let _ = post_feed(&server, "into the void", "").await;
    assert_eq!(server.hub.peer_count(), 0);
}

#[tokio::test]
async fn hub_shutdown_closes_clients() {
    let server = start_server(BridgeMode::Callback).await;
    let mut client = connect(&server).await;
    let _ = next_json(&mut client).await;
    server.wait_for_peers(1).await;

    server.hub.shutdown().await;

    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(frame) = client.next().await {
            match frame {
                Ok(Message::Close(_)) | Err(_) => return true,
                Ok(_) => continue,
            }
        }
        true
    })
    .await;
    assert_eq!(closed, Ok(true));
    assert_eq!(server.hub.peer_count(), 0);
}

#[tokio::test]
async fn store_close_stops_delivery_but_not_creation() {
    let server = start_server(BridgeMode::Queue).await;
    let mut client = connect(&server).await;
    let _ = next_json(&mut client).await;
    server.wait_for_peers(1).await;

    assert!(server.store.close().await.is_ok());
    let _ = post_feed(&server, "unannounced", "").await;

    assert!(client_is_quiet(&mut client).await);
}

async fn client_is_quiet(client: &mut Client) -> bool {
    let next = tokio::time::timeout(Duration::from_millis(200), client.next()).await;
    match next {
        Err(_) => true,
        Ok(Some(Ok(Message::Ping(_) | Message::Pong(_)))) => true,
        Ok(_) => false,
    }
}
