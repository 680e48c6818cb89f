use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::metrics::{CACHE_HITS, CACHE_MISSES};

// Cache entry with timestamp
#[derive(Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: u64,
}

// Time-boxed cache, entries are served while younger than `ttl`
pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    fn is_fresh(&self, entry: &CacheEntry<V>, now: u64) -> bool {
        now.saturating_sub(entry.created_at) < self.ttl.as_millis() as u64
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now_ms();

        if let Some(entry) = self.entries.get(key) {
            if self.is_fresh(&entry, now) {
                CACHE_HITS.inc();
                return Some(entry.value.clone());
            }
        }

        // stale entries go as soon as they are seen
        self.entries
            .remove_if(key, |_, entry| !self.is_fresh(entry, now));
        CACHE_MISSES.inc();
        None
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                created_at: self.clock.now_ms(),
            },
        );
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let fresh = self.is_fresh(entry, now);
            if !fresh {
                removed += 1;
            }
            fresh
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
