//! API Routes
//!
//! Configures the Axum router with all feed service endpoints.

use axum::{
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    accept_handler, channel_threads_handler, create_thread_handler, delete_thread_handler,
    health_handler, like_handler, list_threads_handler, stats_handler, unlike_handler,
    update_thread_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /threads` - Cached page of the global thread list
/// - `POST /threads` - Create a thread
/// - `PATCH /threads/:id` - Update a thread
/// - `DELETE /threads/:id` - Delete a thread
/// - `PUT /threads/:id/like` / `DELETE /threads/:id/like` - Like or unlike
/// - `POST /threads/:id/accept` - Publish a thread waiting in review
/// - `GET /channels/:id/threads` - Cached page of a channel's thread list
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/threads",
            get(list_threads_handler).post(create_thread_handler),
        )
        .route(
            "/threads/:id",
            patch(update_thread_handler).delete(delete_thread_handler),
        )
        .route("/threads/:id/like", put(like_handler).delete(unlike_handler))
        .route("/threads/:id/accept", post(accept_handler))
        .route("/channels/:id/threads", get(channel_threads_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
