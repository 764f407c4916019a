// Path: crates/conduit-middleware/src/cache.rs
//! A TTL-bounded cache backed by `DashMap`, matching the sharded-lock
//! concurrency style used for shared maps elsewhere in this pack (e.g. the
//! provider registry's endpoint table) rather than a single `Mutex`-guarded
//! `HashMap`.

use std::hash::Hash;
use std::time::{Duration, Instant};

use dashmap::DashMap;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// A cache whose entries expire `ttl` after insertion. Reads past expiry
/// return `None` as if the key were absent; expired entries are reclaimed
/// lazily on the next `get` or `set` that touches the same key.
pub struct TtlCache<K, V> {
    entries: DashMap<K, Entry<V>>,
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self { entries: DashMap::new() }
    }

    /// Returns a clone of the cached value if present and not expired.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let Some(entry) = self.entries.get(key) else {
            return None;
        };
        if Instant::now() >= entry.expires_at {
            drop(entry);
            self.entries.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    /// Inserts `value` under `key`, expiring after `ttl`.
    pub fn set(&self, key: K, value: V, ttl: Duration) {
        self.entries.insert(key, Entry { value, expires_at: Instant::now() + ttl });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
