use crate::pricing::models::{CacheKey, RateTriple};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Default freshness window for resolved rates
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

struct CacheEntry {
    value: RateTriple,
    fetched_at: Instant,
    // Wall-clock time of the fetch, reported by `status()`
    fetched_at_utc: DateTime<Utc>,
}

/// In-memory TTL cache of resolved rate triples
///
/// Keyed by `(provider, region, instance_type)`. Entries are only replaced by a
/// newer fetch or dropped by `clear()`; staleness is checked on read. Two
/// concurrent fetches for the same expired key both write, last writer wins.
pub struct PricingCache {
    entries: DashMap<CacheKey, CacheEntry>,
    ttl: Duration,
    max_entries: Option<usize>,
}

/// Snapshot of the cache for the status endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub size: usize,
    pub entries: Vec<CacheEntryStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheEntryStatus {
    pub key: String,
    /// Fetch time in epoch milliseconds
    pub timestamp: i64,
    /// Milliseconds since the fetch
    pub age: u64,
}

impl PricingCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries: None,
        }
    }

    /// Bound the number of entries; the oldest entry is evicted when a new key
    /// would exceed the bound
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries.max(1));
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached rates for `key`, or `None` when missing or older than the TTL
    pub fn get(&self, key: &CacheKey) -> Option<RateTriple> {
        let entry = self.entries.get(key)?;
        if entry.fetched_at.elapsed() < self.ttl {
            Some(entry.value)
        } else {
            None
        }
    }

    /// Store freshly resolved rates, overwriting any previous entry
    pub fn put(&self, key: CacheKey, value: RateTriple) {
        if let Some(max) = self.max_entries {
            if !self.entries.contains_key(&key) && self.entries.len() >= max {
                self.evict_oldest();
            }
        }

        self.entries.insert(
            key,
            CacheEntry {
                value,
                fetched_at: Instant::now(),
                fetched_at_utc: Utc::now(),
            },
        );
        crate::metrics::set_cache_entries(self.entries.len());
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.entries.clear();
        crate::metrics::set_cache_entries(0);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// List all entries (fresh and stale) with their age, oldest first
    pub fn status(&self) -> CacheStatus {
        let mut entries: Vec<CacheEntryStatus> = self
            .entries
            .iter()
            .map(|entry| CacheEntryStatus {
                key: entry.key().to_string(),
                timestamp: entry.fetched_at_utc.timestamp_millis(),
                age: entry.fetched_at.elapsed().as_millis() as u64,
            })
            .collect();
        entries.sort_by(|a, b| b.age.cmp(&a.age).then_with(|| a.key.cmp(&b.key)));

        CacheStatus {
            size: entries.len(),
            entries,
        }
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.fetched_at)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            self.entries.remove(&key);
            tracing::debug!(key = %key, "Evicted oldest pricing cache entry");
        }
    }
}

impl Default for PricingCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
