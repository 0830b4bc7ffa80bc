//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL and
//! revalidation state.

use chrono::Utc;

// == Cache Entry ==
/// Represents a single cached list page with its metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Time the value was written (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
    /// Marked by invalidation; the next read should trigger a re-fetch
    pub stale: bool,
    /// The value holds speculative data not yet confirmed by the API
    pub optimistic: bool,
    /// Store epoch of the last write, rewrite or invalidation
    pub epoch: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new authoritative entry with optional TTL.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl_seconds` - Optional TTL in seconds
    pub fn new(value: V, ttl_seconds: Option<u64>) -> Self {
        let now = current_timestamp_ms();
        let expires_at = ttl_seconds.map(|ttl| now + (ttl * 1000));

        Self {
            value,
            created_at: now,
            expires_at,
            stale: false,
            optimistic: false,
            epoch: 0,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// the expiration time.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => current_timestamp_ms() >= expires,
            None => false,
        }
    }

    // == Replace Optimistically ==
    /// Swaps in a speculative value, keeping the expiry of the fetched one.
    pub fn replace_optimistic(&mut self, value: V) {
        self.value = value;
        self.optimistic = true;
    }

    // == Mark Stale ==
    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(current_timestamp_ms()))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}
