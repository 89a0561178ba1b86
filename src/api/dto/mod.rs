//! Data Transfer Objects for REST request/response serialization.

pub mod common_dto;
pub mod feed_dto;
pub mod search_dto;

pub use common_dto::*;
pub use feed_dto::*;
pub use search_dto::*;
