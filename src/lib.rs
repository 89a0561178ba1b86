//! # feed-pusher
//!
//! Real-time WebSocket fan-out of feed creation events.
//!
//! Feeds are created over REST, stored, and announced on an event bus as
//! `CreatedFeed` notifications. The event bridge turns each notification
//! into a JSON message that the hub pushes to every connected WebSocket
//! client, and the search projection indexes it for full-text queries.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler + Connection loops (ws/)
//!     │
//!     ├── FeedService (service/) ──► EventStore (events/)
//!     │                                   │
//!     │                      ┌────────────┴─────────────┐
//!     │                 EventBridge (ws/)     SearchProjection (search/)
//!     │                      │                          │
//!     ├── Hub (hub/) ◄───────┘                          ▼
//!     ├── SearchService (service/) ──► SearchRepository (search/)
//!     │
//!     └── FeedRepository: PostgreSQL or in-memory (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod hub;
pub mod persistence;
pub mod search;
pub mod service;
pub mod ws;
