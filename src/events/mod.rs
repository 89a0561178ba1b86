//! Event bus: the `CreatedFeed` notification, the [`EventStore`]
//! capability, and its in-process implementation.

pub mod memory;
pub mod message;
pub mod store;

pub use memory::InMemoryEventStore;
pub use message::{CREATED_FEED_SUBJECT, CreatedFeedMessage};
pub use store::{CreatedFeedHandler, EventStore, Subscription};
