// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capacity-bounded memoization cache with per-instance TTL.
//!
//! Used for actor detail lookups and tool-server discovery results, where
//! repeated platform round-trips for the same key are wasteful. Entries
//! expire lazily: nothing sweeps the map in the background, an expired
//! entry is simply treated as a miss (and dropped) the next time it is read.
//! When the cache is full, inserting a new key evicts the least recently
//! used entry.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::trace;

struct Slot<V> {
    value: V,
    expires_at: Instant,
    touched: u64,
}

struct Inner<K, V> {
    slots: HashMap<K, Slot<V>>,
    clock: u64,
}

/// A shared map with a fixed time-to-live and LRU eviction.
///
/// The TTL is set at construction and applies to every entry. A `capacity`
/// of zero disables the size bound entirely. Values are cloned out on read,
/// so `V` is typically an `Arc` or a small serde value.
///
/// Negative results can be memoized by choosing `V = Option<T>`: a hit on
/// `None` ("looked this up before, it does not exist") is then distinct
/// from a miss ("never looked this up").
pub struct TtlCache<K, V> {
    ttl: Duration,
    capacity: usize,
    inner: Mutex<Inner<K, V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            ttl,
            capacity,
            inner: Mutex::new(Inner {
                slots: HashMap::new(),
                clock: 0,
            }),
        }
    }

    /// Look up a key, returning a clone of the value if it is still live.
    ///
    /// A hit refreshes the entry's LRU position but not its expiry. An
    /// expired entry is removed on the way out and reported as a miss.
    pub async fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock().await;
        inner.clock += 1;
        let tick = inner.clock;
        let now = Instant::now();

        let expired = match inner.slots.get_mut(key) {
            Some(slot) if slot.expires_at > now => {
                slot.touched = tick;
                return Some(slot.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            inner.slots.remove(key);
        }
        None
    }

    /// Insert or replace an entry, stamping a fresh expiry.
    ///
    /// If the cache is at capacity and the key is new, the least recently
    /// used entry is evicted first.
    pub async fn set(&self, key: K, value: V) {
        let mut inner = self.inner.lock().await;
        inner.clock += 1;
        let tick = inner.clock;

        if self.capacity > 0
            && inner.slots.len() >= self.capacity
            && !inner.slots.contains_key(&key)
        {
            // Expired slots go first; otherwise the oldest touch loses.
            let now = Instant::now();
            let victim = inner
                .slots
                .iter()
                .min_by_key(|(_, slot)| (slot.expires_at > now, slot.touched))
                .map(|(k, _)| k.clone());
            if let Some(victim) = victim {
                inner.slots.remove(&victim);
                trace!("cache evicted least recently used entry");
            }
        }

        inner.slots.insert(
            key,
            Slot {
                value,
                expires_at: Instant::now() + self.ttl,
                touched: tick,
            },
        );
    }

    /// Remove an entry, returning its value if one was present and live.
    pub async fn remove(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        inner
            .slots
            .remove(key)
            .filter(|slot| slot.expires_at > now)
            .map(|slot| slot.value)
    }

    /// Number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        let inner = self.inner.lock().await;
        let now = Instant::now();
        inner
            .slots
            .values()
            .filter(|slot| slot.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hit_within_ttl_returns_value() {
        let cache = TtlCache::new(8, Duration::from_secs(60));
        cache.set("alpha".to_string(), 1_u32).await;
        assert_eq!(cache.get(&"alpha".to_string()).await, Some(1));
    }

    #[tokio::test]
    async fn expired_entry_reads_as_miss() {
        let cache = TtlCache::new(8, Duration::from_millis(20));
        cache.set("alpha".to_string(), 1_u32).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get(&"alpha".to_string()).await, None);
        // The expired slot was dropped on read.
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn reinsert_after_expiry_is_a_fresh_hit() {
        let cache = TtlCache::new(8, Duration::from_millis(20));
        cache.set("alpha".to_string(), 1_u32).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get(&"alpha".to_string()).await, None);
        cache.set("alpha".to_string(), 2_u32).await;
        assert_eq!(cache.get(&"alpha".to_string()).await, Some(2));
    }

    #[tokio::test]
    async fn set_replaces_existing_value() {
        let cache = TtlCache::new(8, Duration::from_secs(60));
        cache.set("alpha".to_string(), 1_u32).await;
        cache.set("alpha".to_string(), 2_u32).await;
        assert_eq!(cache.get(&"alpha".to_string()).await, Some(2));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn full_cache_evicts_least_recently_used() {
        let cache = TtlCache::new(2, Duration::from_secs(60));
        cache.set("a".to_string(), 1_u32).await;
        cache.set("b".to_string(), 2_u32).await;
        // Touch "a" so "b" is the LRU entry.
        assert_eq!(cache.get(&"a".to_string()).await, Some(1));
        cache.set("c".to_string(), 3_u32).await;

        assert_eq!(cache.get(&"a".to_string()).await, Some(1));
        assert_eq!(cache.get(&"b".to_string()).await, None);
        assert_eq!(cache.get(&"c".to_string()).await, Some(3));
    }

    #[tokio::test]
    async fn zero_capacity_means_unbounded() {
        let cache = TtlCache::new(0, Duration::from_secs(60));
        for i in 0..64_u32 {
            cache.set(i, i).await;
        }
        assert_eq!(cache.len().await, 64);
    }

    #[tokio::test]
    async fn memoized_negative_result_is_a_hit() {
        let cache: TtlCache<String, Option<String>> = TtlCache::new(8, Duration::from_secs(60));
        cache.set("ghost".to_string(), None).await;
        // A memoized None is distinguishable from an absent key.
        assert_eq!(cache.get(&"ghost".to_string()).await, Some(None));
        assert_eq!(cache.get(&"never-seen".to_string()).await, None);
    }

    #[tokio::test]
    async fn remove_drops_the_entry() {
        let cache = TtlCache::new(8, Duration::from_secs(60));
        cache.set("alpha".to_string(), 1_u32).await;
        assert_eq!(cache.remove(&"alpha".to_string()).await, Some(1));
        assert_eq!(cache.get(&"alpha".to_string()).await, None);
    }
}
