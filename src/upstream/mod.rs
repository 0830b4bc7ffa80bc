//! Upstream API Module
//!
//! The remote REST API is the source of truth for threads. The feed cache
//! talks to it through [`ThreadApi`]; the HTTP client and an in-memory
//! implementation are provided.

mod http;
mod memory;

use async_trait::async_trait;

use crate::cache::CacheKey;
use crate::error::Result;
use crate::feed::{ThreadInitialProps, ThreadListResponse, ThreadMutableProps, ThreadReference};

pub use http::HttpThreadApi;
pub use memory::InMemoryThreadApi;

/// Thread endpoints of the upstream API.
#[async_trait]
pub trait ThreadApi: Send + Sync {
    /// Fetches the page of the list identified by `key`.
    async fn list_threads(&self, key: &CacheKey) -> Result<ThreadListResponse>;

    async fn create_thread(&self, initial: &ThreadInitialProps) -> Result<ThreadReference>;

    async fn create_channel_thread(
        &self,
        channel_id: &str,
        initial: &ThreadInitialProps,
    ) -> Result<ThreadReference>;

    async fn update_thread(&self, id: &str, props: &ThreadMutableProps)
        -> Result<ThreadReference>;

    async fn delete_thread(&self, id: &str) -> Result<()>;

    async fn like_post(&self, id: &str) -> Result<()>;

    async fn unlike_post(&self, id: &str) -> Result<()>;
}
