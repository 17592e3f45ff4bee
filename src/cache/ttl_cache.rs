//! In-memory TTL cache for upstream API responses.
//!
//! Process-local memoization keyed by logical request identity (see
//! [`crate::cache::keys`]). Entries expire after a configurable TTL and are
//! evicted lazily on the next `get`; there is no background sweep and no
//! persistence. An expired entry that is never read again simply sits in
//! the map until `clear()`.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

/// Default TTL in seconds (5 minutes).
pub const DEFAULT_TTL_SECS: u64 = 300;

/// A single cached value with its insertion timestamp.
#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    /// Unix timestamp when the entry was stored.
    stored_at: u64,
}

/// Snapshot of cache occupancy, computed without evicting anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub active_entries: usize,
    pub expired_entries: usize,
}

/// Time-boxed memoization map. `get` is the only operation that evicts.
pub struct TtlCache<V> {
    entries: HashMap<String, Entry<V>>,
    ttl_secs: u64,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache whose entries live for `ttl_secs` seconds.
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            entries: HashMap::new(),
            ttl_secs,
        }
    }

    /// Look up a value. A fresh entry is a hit; an expired entry is evicted
    /// and reported as absent; a missing key is a miss.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = now_secs();
        // Check expiry with an immutable borrow first so eviction below can
        // take the map mutably.
        let expired = self.entries.get(key).map(|e| self.expired(e, now));
        match expired {
            Some(false) => {
                debug!(key, "Cache hit");
                self.entries.get(key).map(|e| e.value.clone())
            }
            Some(true) => {
                self.entries.remove(key);
                debug!(key, "Cache entry expired, evicted");
                None
            }
            None => {
                debug!(key, "Cache miss");
                None
            }
        }
    }

    /// Store or overwrite a value with a fresh timestamp. Unconditional.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        debug!(key = %key, "Cache set");
        self.entries.insert(
            key,
            Entry {
                value,
                stored_at: now_secs(),
            },
        );
    }

    /// Empty the cache unconditionally.
    pub fn clear(&mut self) {
        self.entries.clear();
        debug!("Cache cleared");
    }

    /// Count total/active/expired entries against the current time.
    ///
    /// Purely observational: expired entries stay in the map.
    pub fn stats(&self) -> CacheStats {
        let now = now_secs();
        let total_entries = self.entries.len();
        let expired_entries = self
            .entries
            .values()
            .filter(|e| self.expired(e, now))
            .count();
        CacheStats {
            total_entries,
            active_entries: total_entries - expired_entries,
            expired_entries,
        }
    }

    fn expired(&self, entry: &Entry<V>, now: u64) -> bool {
        now.saturating_sub(entry.stored_at) > self.ttl_secs
    }

    /// Backdate an entry's timestamp, as if it had been stored `secs` ago.
    #[cfg(test)]
    fn age_entry(&mut self, key: &str, secs: u64) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.stored_at = entry.stored_at.saturating_sub(secs);
        }
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
