//! Minimal TTL cache
//!
//! Used for cheap memoization of aggregate queries (bidder statistics).
//! Entries expire after a fixed TTL; there is no size bound or eviction
//! beyond expiry, which is all this workload needs.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, (Instant, V)>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Get a live entry; expired entries are dropped on access
    pub fn get(&mut self, key: &K) -> Option<V> {
        match self.entries.get(key) {
            Some((inserted, value)) if inserted.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.entries.insert(key, (Instant::now(), value));
    }

    /// Drop all entries regardless of age
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_entry_is_returned() {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("stats", 42);
        assert_eq!(cache.get(&"stats"), Some(42));
    }

    #[test]
    fn expired_entry_is_dropped() {
        let mut cache = TtlCache::new(Duration::ZERO);
        cache.insert("stats", 42);
        assert_eq!(cache.get(&"stats"), None);
    }

    #[test]
    fn clear_empties_cache() {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("a", 1);
        cache.clear();
        assert_eq!(cache.get(&"a"), None);
    }
}
