//! Bus notification emitted when a feed is created.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Feed;
use crate::error::PusherError;

/// Subject the write side publishes created feeds on.
pub const CREATED_FEED_SUBJECT: &str = "CreatedFeed";

/// Notification carried by the event bus for every created feed.
///
/// Encoded with `bincode` on the bus. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedFeedMessage {
    /// Feed identifier.
    pub id: String,
    /// Feed title.
    pub title: String,
    /// Feed description.
    pub description: String,
    /// When the feed was created.
    pub created_at: DateTime<Utc>,
}

impl CreatedFeedMessage {
    /// Encodes the message into a bus frame.
    ///
    /// # Errors
    ///
    /// Returns [`PusherError::Encode`] if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>, PusherError> {
        bincode::serialize(self).map_err(|e| PusherError::Encode(e.to_string()))
    }

    /// Decodes a bus frame.
    ///
    /// # Errors
    ///
    /// Returns [`PusherError::Decode`] if the frame is not a valid
    /// encoding of this message.
    pub fn decode(frame: &[u8]) -> Result<Self, PusherError> {
        bincode::deserialize(frame).map_err(|e| PusherError::Decode(e.to_string()))
    }
}

impl From<&Feed> for CreatedFeedMessage {
    fn from(feed: &Feed) -> Self {
        Self {
            id: feed.id.clone(),
            title: feed.title.clone(),
            description: feed.description.clone(),
            created_at: feed.created_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn frame_preserves_timestamp_precision() {
        let feed = Feed::new("title".to_string(), "body".to_string());
        let msg = CreatedFeedMessage::from(&feed);
        let Ok(frame) = msg.encode() else {
            panic!("encode failed");
        };
        let Ok(decoded) = CreatedFeedMessage::decode(&frame) else {
            panic!("decode failed");
        };
        assert_eq!(decoded, msg);
        assert_eq!(decoded.created_at, feed.created_at);
    }

    #[test]
    fn garbage_frame_is_a_decode_error() {
        let result = CreatedFeedMessage::decode(&[0xde, 0xad]);
        assert!(matches!(result, Err(PusherError::Decode(_))));
    }
}
