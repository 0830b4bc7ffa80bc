//! Cache Store Module
//!
//! Keyed store for thread-list pages combining HashMap storage with LRU
//! tracking, TTL expiration, optimistic rewrites and stale marking.

use std::collections::HashMap;

use tracing::debug;

use crate::cache::{CacheEntry, CacheKey, CacheStats, LruTracker};
use crate::error::{FeedError, Result};

// == Cache Store ==
/// Cache storage with LRU eviction, TTL support and filter-based mutation.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<CacheKey, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker<CacheKey>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// Default TTL in seconds
    default_ttl: u64,
    /// Bumped by every write, rewrite, invalidation and fetch start
    epoch: u64,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and default TTL.
    ///
    /// # Arguments
    /// * `max_entries` - Maximum number of entries the cache can hold
    /// * `default_ttl` - Default TTL in seconds for entries without explicit TTL
    pub fn new(max_entries: usize, default_ttl: u64) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_entries,
            default_ttl,
            epoch: 0,
        }
    }

    // == Set ==
    /// Stores an authoritative value with optional TTL.
    ///
    /// Overwriting clears any stale or optimistic state of the previous entry.
    /// If the cache is at capacity, the least recently used entry is evicted.
    pub fn set(&mut self, key: CacheKey, value: V, ttl: Option<u64>) -> Result<()> {
        let epoch = self.next_epoch();
        self.insert(key, value, ttl, epoch)
    }

    fn insert(&mut self, key: CacheKey, value: V, ttl: Option<u64>, epoch: u64) -> Result<()> {
        let is_overwrite = self.entries.contains_key(&key);

        if !is_overwrite && self.entries.len() >= self.max_entries {
            if let Some(evicted_key) = self.lru.evict_oldest() {
                debug!(key = %evicted_key, "evicting least recently used page");
                self.entries.remove(&evicted_key);
                self.stats.record_eviction();
            } else {
                return Err(FeedError::CacheFull(
                    "Cache is full and eviction failed".to_string(),
                ));
            }
        }

        let effective_ttl = Some(ttl.unwrap_or(self.default_ttl));
        let mut entry = CacheEntry::new(value, effective_ttl);
        entry.epoch = epoch;
        self.lru.touch(&key);
        self.entries.insert(key, entry);
        self.stats.set_total_entries(self.entries.len());

        Ok(())
    }

    // == Get ==
    /// Retrieves an entry by key, recording a hit or miss.
    ///
    /// Expired entries are removed and counted as misses. Stale entries are
    /// still returned; the caller decides whether to re-fetch.
    pub fn get(&mut self, key: &CacheKey) -> Result<CacheEntry<V>> {
        match self.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                self.entries.remove(key);
                self.lru.remove(key);
                self.stats.set_total_entries(self.entries.len());
                self.stats.record_miss();
                Err(FeedError::NotFound(key.to_string()))
            }
            Some(entry) => {
                let entry = entry.clone();
                self.stats.record_hit();
                self.lru.touch(key);
                Ok(entry)
            }
            None => {
                self.stats.record_miss();
                Err(FeedError::NotFound(key.to_string()))
            }
        }
    }

    // == Peek ==
    /// Returns the current value without touching stats or LRU order.
    pub fn peek(&self, key: &CacheKey) -> Option<&V> {
        self.entries.get(key).map(|entry| &entry.value)
    }

    /// Returns the full entry without touching stats or LRU order.
    pub fn peek_entry(&self, key: &CacheKey) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    // == Delete ==
    pub fn delete(&mut self, key: &CacheKey) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.lru.remove(key);
            self.stats.set_total_entries(self.entries.len());
            Ok(())
        } else {
            Err(FeedError::NotFound(key.to_string()))
        }
    }

    // == Matching Keys ==
    /// Returns every cached key accepted by `filter`.
    pub fn matching_keys<F>(&self, filter: F) -> Vec<CacheKey>
    where
        F: Fn(&CacheKey) -> bool,
    {
        self.entries.keys().filter(|key| filter(key)).cloned().collect()
    }

    // == Mutate ==
    /// Applies `mutator` to every entry whose key is accepted by `filter`.
    ///
    /// The mutator receives the current value and returns a new one, or
    /// `None` to leave that entry untouched. Replaced entries are flagged
    /// optimistic. Returns the number of entries rewritten.
    pub fn mutate<F, M>(&mut self, filter: F, mut mutator: M) -> usize
    where
        F: Fn(&CacheKey) -> bool,
        M: FnMut(&V) -> Option<V>,
    {
        let epoch = self.next_epoch();
        let mut rewritten = 0;
        for (key, entry) in self.entries.iter_mut() {
            if !filter(key) {
                continue;
            }
            if let Some(next) = mutator(&entry.value) {
                debug!(key = %key, "applying optimistic write");
                entry.replace_optimistic(next);
                entry.epoch = epoch;
                rewritten += 1;
            }
        }
        self.stats.record_optimistic_writes(rewritten);
        rewritten
    }

    // == Invalidate ==
    /// Marks every entry accepted by `filter` as stale.
    ///
    /// Returns the keys that were marked.
    pub fn invalidate<F>(&mut self, filter: F) -> Vec<CacheKey>
    where
        F: Fn(&CacheKey) -> bool,
    {
        let epoch = self.next_epoch();
        let mut marked = Vec::new();
        for (key, entry) in self.entries.iter_mut() {
            if filter(key) {
                entry.mark_stale();
                entry.epoch = epoch;
                marked.push(key.clone());
            }
        }
        self.stats.record_invalidations(marked.len());
        marked
    }

    // == Fetch Tickets ==
    /// Returns the ticket of a fetch that is about to start.
    ///
    /// A fetch result is only written back while no write, rewrite or
    /// invalidation of its entry happened after the ticket was taken.
    pub fn begin_fetch(&mut self) -> u64 {
        self.next_epoch()
    }

    /// Whether the entry under `key` changed after `ticket` was taken.
    pub fn is_superseded(&self, key: &CacheKey, ticket: u64) -> bool {
        self.entries
            .get(key)
            .map(|entry| entry.epoch > ticket)
            .unwrap_or(false)
    }

    fn next_epoch(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    // == Fill ==
    /// Stores a value fetched on a miss under `ticket`.
    ///
    /// Returns false, leaving the cached entry alone, when the entry changed
    /// after the fetch started.
    pub fn fill(&mut self, key: CacheKey, value: V, ticket: u64) -> Result<bool> {
        if self.is_superseded(&key, ticket) {
            debug!(key = %key, ticket, "dropping superseded fetch result");
            return Ok(false);
        }
        self.insert(key, value, None, ticket)?;
        Ok(true)
    }

    // == Revalidated ==
    /// Writes back an authoritative value fetched to replace stale data.
    ///
    /// Same rule as [`fill`](Self::fill): a result older than the entry's
    /// last change is dropped and the entry keeps its stale flag.
    pub fn revalidated(&mut self, key: CacheKey, value: V, ticket: u64) -> Result<bool> {
        let stored = self.fill(key, value, ticket)?;
        if stored {
            self.stats.record_revalidation();
        }
        Ok(stored)
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired_keys: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();

        for key in expired_keys {
            self.entries.remove(&key);
            self.lru.remove(&key);
        }

        self.stats.set_total_entries(self.entries.len());
        count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
