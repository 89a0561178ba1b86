//! Service layer: business logic orchestration.
//!
//! [`FeedService`] stores feed records through a
//! [`super::persistence::FeedRepository`] and announces them on the
//! [`super::events::EventStore`]. [`SearchService`] answers queries from
//! the [`super::search::SearchRepository`] and rebuilds it on demand.

pub mod feed_service;
pub mod search_service;

pub use feed_service::FeedService;
pub use search_service::{ReindexReport, SearchService};
