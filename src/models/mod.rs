//! Request and Response models for the feed service API
//!
//! DTOs used for serializing/deserializing HTTP query strings and bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{AcceptQuery, CreateThreadRequest, ListQuery, UpdateThreadRequest};
pub use responses::{DeleteResponse, HealthResponse, LikeResponse, StatsResponse};
