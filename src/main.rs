//! feed-pusher server entry point.
//!
//! Starts the hub, the event bridge, the search projection, and the Axum
//! HTTP server with REST and WebSocket endpoints.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use feed_pusher::api;
use feed_pusher::app_state::AppState;
use feed_pusher::config::{LogFormat, PusherConfig};
use feed_pusher::events::{EventStore, InMemoryEventStore};
use feed_pusher::hub::Hub;
use feed_pusher::persistence::{FeedRepository, InMemoryFeedRepository, PostgresFeedRepository};
use feed_pusher::search::{InMemorySearchRepository, SearchProjection, SearchRepository};
use feed_pusher::service::{FeedService, SearchService};
use feed_pusher::ws::event_bridge::EventBridge;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = PusherConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting feed-pusher");

    // Connection hub
    let (hub, hub_task) = Hub::spawn(config.hub_config());

    // Event bus
    let store = Arc::new(InMemoryEventStore::new(config.event_bus_capacity));
    let events: Arc<dyn EventStore> = Arc::clone(&store) as Arc<dyn EventStore>;

    // Storage
    let repository: Arc<dyn FeedRepository> = if config.persistence_enabled {
        tracing::info!("connecting to PostgreSQL");
        Arc::new(PostgresFeedRepository::connect(&config).await?)
    } else {
        tracing::info!("persistence disabled, keeping feeds in memory");
        Arc::new(InMemoryFeedRepository::new())
    };

    // Bridge bus notifications to connected clients
    let bridge = EventBridge::new(hub.clone());
    let _bridge_handle = bridge.attach(store.as_ref(), config.bridge_mode).await?;

    // Project bus notifications into the search index
    let index: Arc<dyn SearchRepository> = Arc::new(InMemorySearchRepository::new());
    let _projection = SearchProjection::new(Arc::clone(&index))
        .attach(store.as_ref())
        .await?;

    // Build application state
    let app_state = AppState {
        hub: hub.clone(),
        feed_service: Arc::new(FeedService::new(Arc::clone(&repository), events)),
        search_service: Arc::new(SearchService::new(index, repository)),
    };
    let app = api::build_app(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(hub))
    .await?;

    store.close().await?;
    if let Err(e) = hub_task.await {
        tracing::warn!(error = %e, "hub task ended abnormally");
    }
    tracing::info!("feed-pusher stopped");

    Ok(())
}

/// Resolves on Ctrl-C after closing every WebSocket connection.
async fn shutdown_signal(hub: Hub) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!(peers = hub.peer_count(), "shutdown signal received");
    hub.shutdown().await;
}
