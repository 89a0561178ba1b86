//! REST surface tests: feed creation, listing, search and health.

#![allow(clippy::panic)]

mod common;

use serde_json::{Value, json};

use common::start_server;
use feed_pusher::config::BridgeMode;
use feed_pusher::events::EventStore;

async fn get_json(url: &str) -> (reqwest::StatusCode, Value) {
    let Ok(response) = reqwest::get(url).await else {
        panic!("GET {url} failed");
    };
    let status = response.status();
    let Ok(body) = response.json::<Value>().await else {
        panic!("GET {url} returned non-json");
    };
    (status, body)
}

#[tokio::test]
async fn health_reports_connected_peers() {
    let server = start_server(BridgeMode::Callback).await;
    let (status, body) = get_json(&server.http_url("/health")).await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["peers"], 0);
    assert_eq!(body["indexed"], 0);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn create_then_list_feeds() {
    let server = start_server(BridgeMode::Callback).await;
    let client = reqwest::Client::new();

    for title in ["one", "two", "three"] {
        let Ok(response) = client
            .post(server.http_url("/api/v1/feeds"))
            .json(&json!({ "title": title, "description": "body" }))
            .send()
            .await
        else {
            panic!("POST failed");
        };
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    }

    let (status, body) = get_json(&server.http_url("/api/v1/feeds?page=1&per_page=2")).await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["total_pages"], 2);
    let Some(data) = body["data"].as_array() else {
        panic!("data is not an array");
    };
    assert_eq!(data.len(), 2);
    assert_eq!(data.first().map(|f| &f["title"]), Some(&json!("one")));

    let (_, body) = get_json(&server.http_url("/api/v1/feeds?page=2&per_page=2")).await;
    assert_eq!(body["data"][0]["title"], "three");
}

#[tokio::test]
async fn get_feed_by_id() {
    let server = start_server(BridgeMode::Callback).await;
    let Ok(response) = reqwest::Client::new()
        .post(server.http_url("/api/v1/feeds"))
        .json(&json!({ "title": "findable", "description": "here" }))
        .send()
        .await
    else {
        panic!("POST failed");
    };
    let Ok(created) = response.json::<Value>().await else {
        panic!("bad feed body");
    };
    let Some(id) = created["id"].as_str() else {
        panic!("feed has no id");
    };

    let (status, body) = get_json(&server.http_url(&format!("/api/v1/feeds/{id}"))).await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(body, created);

    let (status, body) = get_json(&server.http_url("/api/v1/feeds/missing")).await;
    assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], 2001);
}

#[tokio::test]
async fn per_page_is_clamped() {
    let server = start_server(BridgeMode::Callback).await;
    let (_, body) = get_json(&server.http_url("/api/v1/feeds?page=0&per_page=1000")).await;
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["per_page"], 100);
}

#[tokio::test]
async fn blank_title_is_rejected() {
    let server = start_server(BridgeMode::Callback).await;
    let Ok(response) = reqwest::Client::new()
        .post(server.http_url("/api/v1/feeds"))
        .json(&json!({ "title": "   " }))
        .send()
        .await
    else {
        panic!("POST failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let Ok(body) = response.json::<Value>().await else {
        panic!("error body is not json");
    };
    assert_eq!(body["error"]["code"], 1001);
}

async fn create(client: &reqwest::Client, server: &common::TestServer, title: &str) -> Value {
    let Ok(response) = client
        .post(server.http_url("/api/v1/feeds"))
        .json(&json!({ "title": title, "description": "searchable body" }))
        .send()
        .await
    else {
        panic!("POST failed");
    };
    let Ok(feed) = response.json::<Value>().await else {
        panic!("bad feed body");
    };
    feed
}

#[tokio::test]
async fn created_feed_becomes_searchable() {
    let server = start_server(BridgeMode::Callback).await;
    let client = reqwest::Client::new();
    let feed = create(&client, &server, "Quarterly Roadmap").await;
    let _ = create(&client, &server, "Lunch menu").await;

    let hits = server.wait_for_hits("roadmap", 1).await;
    assert_eq!(hits[0]["id"], feed["id"]);
    assert_eq!(hits[0]["created_at"], feed["created_at"]);

    let hits = server.wait_for_hits("searchable", 2).await;
    assert_eq!(hits.as_array().map(Vec::len), Some(2));

    let (_, health) = get_json(&server.http_url("/health")).await;
    assert_eq!(health["indexed"], 2);
}

#[tokio::test]
async fn search_without_query_is_rejected() {
    let server = start_server(BridgeMode::Callback).await;
    for path in ["/api/v1/search", "/api/v1/search?q=", "/api/v1/search?q=%20%20"] {
        let (status, body) = get_json(&server.http_url(path)).await;
        assert_eq!(status, reqwest::StatusCode::BAD_REQUEST, "{path}");
        assert_eq!(body["error"]["code"], 1001);
    }
}

#[tokio::test]
async fn reindex_restores_feeds_missed_by_the_bus() {
    let server = start_server(BridgeMode::Callback).await;
    let client = reqwest::Client::new();
    let _ = create(&client, &server, "before outage").await;
    let _ = server.wait_for_hits("outage", 1).await;

    // Feeds created while the bus is down never reach the index.
    assert!(server.store.close().await.is_ok());
    let _ = create(&client, &server, "during outage").await;
    let (_, hits) = get_json(&server.http_url("/api/v1/search?q=during")).await;
    assert_eq!(hits, json!([]));

    let Ok(response) = client.post(server.http_url("/api/v1/reindex")).send().await else {
        panic!("reindex request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let Ok(report) = response.json::<Value>().await else {
        panic!("bad reindex body");
    };
    assert_eq!(report["total_feeds"], 2);
    assert_eq!(report["indexed_count"], 2);
    assert!(report["timestamp"].is_string());

    let hits = server.wait_for_hits("outage", 2).await;
    assert_eq!(hits.as_array().map(Vec::len), Some(2));
}
