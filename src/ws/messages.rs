//! WebSocket message envelope delivered to peers.
//!
//! Every server-originated text frame is one [`WsMessage`] serialized as
//! JSON. The hub treats the encoded bytes as opaque; only this module and
//! the event bridge know the shape.

use axum::body::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::PeerId;
use crate::error::PusherError;
use crate::events::CreatedFeedMessage;

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Server-generated message ID.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp of when the message was built.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Sent once to a peer right after it registers.
    Welcome,
    /// Broadcast for every feed the write side creates.
    CreatedFeed,
}

/// Payload of a [`WsMessageType::CreatedFeed`] message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedFeedPayload {
    /// Feed identifier.
    pub id: String,
    /// Feed title.
    pub title: String,
    /// Feed description.
    pub description: String,
    /// When the feed was created.
    pub created_at: DateTime<Utc>,
}

impl WsMessage {
    fn build(msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Greeting for a newly registered peer.
    #[must_use]
    pub fn welcome(peer_id: &PeerId) -> Self {
        Self::build(
            WsMessageType::Welcome,
            serde_json::json!({
                "message": "Connected to feed pusher",
                "peer_id": peer_id,
            }),
        )
    }

    /// Broadcast message for a created feed.
    ///
    /// # Errors
    ///
    /// Returns [`PusherError::Encode`] if the payload cannot be converted
    /// to JSON.
    pub fn created_feed(event: &CreatedFeedMessage) -> Result<Self, PusherError> {
        let payload = CreatedFeedPayload {
            id: event.id.clone(),
            title: event.title.clone(),
            description: event.description.clone(),
            created_at: event.created_at,
        };
        let value =
            serde_json::to_value(&payload).map_err(|e| PusherError::Encode(e.to_string()))?;
        Ok(Self::build(WsMessageType::CreatedFeed, value))
    }

    /// Serializes the envelope into an outbound payload.
    ///
    /// # Errors
    ///
    /// Returns [`PusherError::Encode`] on serialization failure.
    pub fn to_payload(&self) -> Result<Bytes, PusherError> {
        serde_json::to_vec(self)
            .map(Bytes::from)
            .map_err(|e| PusherError::Encode(e.to_string()))
    }
}
