//! Domain layer: feed records and peer identity.

pub mod feed;
pub mod peer_id;

pub use feed::Feed;
pub use peer_id::PeerId;
