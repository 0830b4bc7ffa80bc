//! Cache Module
//!
//! Keyed in-memory store for thread-list pages with TTL expiration, LRU
//! eviction, optimistic rewrites and stale marking.

mod entry;
mod key;
mod lru;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

use std::sync::Arc;

use tokio::sync::RwLock;

// Re-export public types
pub use entry::CacheEntry;
pub use key::{CacheKey, ListKey, ListParams};
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::CacheStore;

/// Store handle shared between the reader, the mutations and background tasks.
pub type SharedStore<V> = Arc<RwLock<CacheStore<V>>>;

/// Wraps a store for sharing.
pub fn shared<V>(store: CacheStore<V>) -> SharedStore<V> {
    Arc::new(RwLock::new(store))
}
