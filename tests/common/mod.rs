//! Shared harness: boots the full application on an ephemeral port.

#![allow(dead_code, clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use feed_pusher::api;
use feed_pusher::app_state::AppState;
use feed_pusher::config::BridgeMode;
use feed_pusher::events::{EventStore, InMemoryEventStore, Subscription};
use feed_pusher::hub::{Hub, HubConfig};
use feed_pusher::persistence::{FeedRepository, InMemoryFeedRepository};
use feed_pusher::search::{InMemorySearchRepository, SearchProjection, SearchRepository};
use feed_pusher::service::{FeedService, SearchService};
use feed_pusher::ws::event_bridge::{BridgeHandle, EventBridge};

/// A running server and the handles needed to observe it.
pub struct TestServer {
    pub addr: SocketAddr,
    pub hub: Hub,
    pub store: Arc<InMemoryEventStore>,
    _bridge: BridgeHandle,
    _projection: Subscription,
}

impl TestServer {
    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Polls the search endpoint until `query` returns `count` feeds.
    pub async fn wait_for_hits(&self, query: &str, count: usize) -> serde_json::Value {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        let url = self.http_url(&format!("/api/v1/search?q={query}"));
        loop {
            let Ok(resp) = reqwest::get(&url).await else {
                panic!("search request failed");
            };
            let Ok(body) = resp.json::<serde_json::Value>().await else {
                panic!("search body is not JSON");
            };
            if body.as_array().map(Vec::len) == Some(count) {
                return body;
            }
            if tokio::time::Instant::now() > deadline {
                panic!("expected {count} hits for {query:?}, got {body}");
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Polls until the hub holds exactly `count` peers.
    pub async fn wait_for_peers(&self, count: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while self.hub.peer_count() != count {
            if tokio::time::Instant::now() > deadline {
                panic!(
                    "expected {count} peers, hub has {}",
                    self.hub.peer_count()
                );
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

pub async fn start_server(mode: BridgeMode) -> TestServer {
    let (hub, _hub_task) = Hub::spawn(HubConfig::default());
    let store = Arc::new(InMemoryEventStore::new(64));
    let events: Arc<dyn EventStore> = Arc::clone(&store) as Arc<dyn EventStore>;

    let Ok(bridge) = EventBridge::new(hub.clone())
        .attach(store.as_ref(), mode)
        .await
    else {
        panic!("bridge attach failed");
    };

    let index: Arc<dyn SearchRepository> = Arc::new(InMemorySearchRepository::new());
    let Ok(projection) = SearchProjection::new(Arc::clone(&index))
        .attach(store.as_ref())
        .await
    else {
        panic!("projection attach failed");
    };

    let repository: Arc<dyn FeedRepository> = Arc::new(InMemoryFeedRepository::new());
    let state = AppState {
        hub: hub.clone(),
        feed_service: Arc::new(FeedService::new(Arc::clone(&repository), events)),
        search_service: Arc::new(SearchService::new(index, repository)),
    };
    let app = api::build_app(state);

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await;
    });

    TestServer {
        addr,
        hub,
        store,
        _bridge: bridge,
        _projection: projection,
    }
}
