//! API Module
//!
//! HTTP handlers and routing for the feed service.
//!
//! # Endpoints
//! - `GET /threads`, `GET /channels/:id/threads` - Cached thread lists
//! - `POST /threads`, `PATCH /threads/:id`, `DELETE /threads/:id` - Thread mutations
//! - `PUT /threads/:id/like`, `DELETE /threads/:id/like` - Likes
//! - `POST /threads/:id/accept` - Moderation
//! - `GET /stats`, `GET /health` - Operations

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
