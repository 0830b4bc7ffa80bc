//! reqwest client for the upstream thread endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::cache::CacheKey;
use crate::error::{FeedError, Result};
use crate::feed::{ThreadInitialProps, ThreadListResponse, ThreadMutableProps, ThreadReference};
use crate::upstream::ThreadApi;

/// Thread API client speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpThreadApi {
    client: Client,
    base_url: String,
}

impl HttpThreadApi {
    /// Creates a client for the API rooted at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "upstream request failed");
        Err(FeedError::Upstream {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ThreadApi for HttpThreadApi {
    async fn list_threads(&self, key: &CacheKey) -> Result<ThreadListResponse> {
        debug!(key = %key, "fetching thread list");
        let request = self
            .client
            .get(self.url(&key.path()))
            .query(&key.params.query_pairs());
        self.send_json(request).await
    }

    async fn create_thread(&self, initial: &ThreadInitialProps) -> Result<ThreadReference> {
        let request = self.client.post(self.url("/threads")).json(initial);
        self.send_json(request).await
    }

    async fn create_channel_thread(
        &self,
        channel_id: &str,
        initial: &ThreadInitialProps,
    ) -> Result<ThreadReference> {
        let request = self
            .client
            .post(self.url(&format!("/channels/{}/threads", channel_id)))
            .json(initial);
        self.send_json(request).await
    }

    async fn update_thread(
        &self,
        id: &str,
        props: &ThreadMutableProps,
    ) -> Result<ThreadReference> {
        let request = self
            .client
            .patch(self.url(&format!("/threads/{}", id)))
            .json(props);
        self.send_json(request).await
    }

    async fn delete_thread(&self, id: &str) -> Result<()> {
        let request = self.client.delete(self.url(&format!("/threads/{}", id)));
        self.send(request).await.map(|_| ())
    }

    async fn like_post(&self, id: &str) -> Result<()> {
        let request = self.client.put(self.url(&format!("/likes/post/{}", id)));
        self.send(request).await.map(|_| ())
    }

    async fn unlike_post(&self, id: &str) -> Result<()> {
        let request = self.client.delete(self.url(&format!("/likes/post/{}", id)));
        self.send(request).await.map(|_| ())
    }
}
