//! WebSocket layer: upgrade endpoint, per-connection loops, wire messages,
//! and the bridge from the event bus to the hub.
//!
//! The endpoint at `/ws` is push-only from the application's point of
//! view: peers receive a welcome message and every created feed; frames
//! they send are echoed back.

pub mod connection;
pub mod event_bridge;
pub mod handler;
pub mod messages;
