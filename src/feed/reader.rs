//! Stale-while-revalidate read path over the cache store.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::{CacheKey, SharedStore};
use crate::error::Result;
use crate::feed::{InvalidationScope, ThreadListResponse};
use crate::upstream::ThreadApi;

/// Reads thread-list pages through the cache.
///
/// A fresh hit is served from the store. A stale hit is served from the
/// store while a background fetch replaces it; at most one background fetch
/// runs per key unless the entry changes while it is in flight. A miss
/// fetches from upstream and fills the store.
///
/// Every fetch takes a ticket from the store before calling upstream. A
/// result that lands after a newer write, optimistic rewrite or
/// invalidation of its entry is dropped.
#[derive(Clone)]
pub struct FeedReader {
    store: SharedStore<ThreadListResponse>,
    api: Arc<dyn ThreadApi>,
    /// Background fetches by key, with the ticket each one started under
    in_flight: Arc<Mutex<HashMap<CacheKey, u64>>>,
}

impl FeedReader {
    pub fn new(store: SharedStore<ThreadListResponse>, api: Arc<dyn ThreadApi>) -> Self {
        Self {
            store,
            api,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn store(&self) -> &SharedStore<ThreadListResponse> {
        &self.store
    }

    pub fn api(&self) -> &Arc<dyn ThreadApi> {
        &self.api
    }

    pub async fn list_threads(&self, key: &CacheKey) -> Result<ThreadListResponse> {
        let cached = self.store.write().await.get(key);

        match cached {
            Ok(entry) if !entry.stale => Ok(entry.value),
            Ok(entry) => {
                self.spawn_refetch(key.clone()).await;
                Ok(entry.value)
            }
            Err(_) => {
                debug!(key = %key, "cache miss");
                let ticket = self.store.write().await.begin_fetch();
                let page = self.api.list_threads(key).await?;
                let stored = self
                    .store
                    .write()
                    .await
                    .fill(key.clone(), page.clone(), ticket)?;
                if !stored {
                    debug!(key = %key, "page changed while fetching, kept cached entry");
                }
                Ok(page)
            }
        }
    }

    /// Fetches `key` from upstream and writes the result back unless the
    /// entry changed in the meantime.
    pub async fn refetch(&self, key: &CacheKey) -> Result<ThreadListResponse> {
        let ticket = self.store.write().await.begin_fetch();
        self.fetch_into(key, ticket).await.map(|(page, _)| page)
    }

    async fn fetch_into(&self, key: &CacheKey, ticket: u64) -> Result<(ThreadListResponse, bool)> {
        let page = self.api.list_threads(key).await?;
        let stored = self
            .store
            .write()
            .await
            .revalidated(key.clone(), page.clone(), ticket)?;
        Ok((page, stored))
    }

    /// Eagerly re-fetches every cached page matched by `scope`.
    ///
    /// A page that fails to re-fetch is marked stale so the next read tries
    /// again. Returns the number of pages replaced.
    pub async fn refetch_matching(&self, scope: &InvalidationScope) -> usize {
        let keys = self.store.read().await.matching_keys(|key| scope.matches(key));
        let mut replaced = 0;

        for key in keys {
            let ticket = self.store.write().await.begin_fetch();
            match self.fetch_into(&key, ticket).await {
                Ok((_, true)) => replaced += 1,
                Ok((_, false)) => debug!(key = %key, "page changed during re-fetch"),
                Err(e) => {
                    warn!(key = %key, error = %e, "re-fetch failed, leaving page stale");
                    self.store.write().await.invalidate(|k| k == &key);
                }
            }
        }

        replaced
    }

    /// Starts a background re-fetch of `key` unless one is already running
    /// for the entry's current state.
    ///
    /// A running fetch that started before the entry last changed would be
    /// dropped on landing, so another one is started next to it. Returns the
    /// task handle when a fetch was started.
    pub async fn spawn_refetch(&self, key: CacheKey) -> Option<JoinHandle<()>> {
        let (ticket, changed_at) = {
            let mut store = self.store.write().await;
            let changed_at = store.peek_entry(&key).map(|e| e.epoch).unwrap_or(0);
            (store.begin_fetch(), changed_at)
        };

        {
            let mut in_flight = self.in_flight.lock().await;
            if let Some(started) = in_flight.get(&key) {
                if *started >= changed_at {
                    debug!(key = %key, "re-fetch already in flight");
                    return None;
                }
                debug!(key = %key, "in-flight re-fetch is outdated, starting another");
            }
            in_flight.insert(key.clone(), ticket);
        }

        let reader = self.clone();
        Some(tokio::spawn(async move {
            match reader.fetch_into(&key, ticket).await {
                Ok((_, true)) => {}
                Ok((_, false)) => debug!(key = %key, "background re-fetch superseded"),
                Err(e) => warn!(key = %key, error = %e, "background re-fetch failed"),
            }
            let mut in_flight = reader.in_flight.lock().await;
            if in_flight.get(&key) == Some(&ticket) {
                in_flight.remove(&key);
            }
        }))
    }
}
