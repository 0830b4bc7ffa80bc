//! Error types for the feed cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Feed Error Enum ==
/// Unified error type for the feed cache and its upstream calls.
#[derive(Error, Debug)]
pub enum FeedError {
    /// Key or thread not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Cache is full and eviction failed
    #[error("Cache full: {0}")]
    CacheFull(String),

    /// The upstream API answered with a non-success status
    #[error("Upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// The upstream API could not be reached or its body could not be decoded
    #[error("Transport error: {0}")]
    Transport(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => FeedError::Upstream {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => FeedError::Transport(err.to_string()),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for FeedError {
    fn into_response(self) -> Response {
        let status = match &self {
            FeedError::NotFound(_) => StatusCode::NOT_FOUND,
            FeedError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            FeedError::CacheFull(_) => StatusCode::SERVICE_UNAVAILABLE,
            FeedError::Upstream { status, .. } => {
                match StatusCode::from_u16(*status) {
                    Ok(code) if code.is_client_error() => code,
                    _ => StatusCode::BAD_GATEWAY,
                }
            }
            FeedError::Transport(_) => StatusCode::BAD_GATEWAY,
            FeedError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the feed cache.
pub type Result<T> = std::result::Result<T, FeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let response = FeedError::NotFound("t1".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_upstream_client_error_is_forwarded() {
        let response = FeedError::Upstream {
            status: 403,
            message: "forbidden".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_upstream_server_error_is_bad_gateway() {
        let response = FeedError::Upstream {
            status: 500,
            message: "boom".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
