//! Bounded LRU cache used as the local tier of a near-cached map.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};

/// LRU cache with a fixed entry capacity.
///
/// Reads refresh recency, so the entry evicted on overflow is the least recently read or
/// written one. Recency is kept in an ordered index, so reads and writes cost `O(log n)`
/// under a single lock.
///
/// Removals bump a generation counter. A reader that fetched a value from elsewhere can
/// install it with [`LruCache::put_if_unchanged`], which refuses when anything was removed
/// since the reader took [`LruCache::generation`].
pub struct LruCache<K, V> {
    capacity: usize,
    inner: Mutex<LruCacheInner<K, V>>,
}

struct LruCacheInner<K, V> {
    /// Value and its current recency stamp
    map: HashMap<K, (V, u64)>,
    /// Recency stamp to key, oldest first
    order: BTreeMap<u64, K>,
    next_stamp: u64,
    generation: u64,
    evictions: u64,
}

impl<K, V> LruCacheInner<K, V>
where
    K: Eq + Hash + Clone,
{
    fn stamp(&mut self) -> u64 {
        let stamp = self.next_stamp;
        self.next_stamp += 1;
        stamp
    }

    fn touch(&mut self, key: &K) {
        let stamp = self.stamp();
        if let Some((_, old)) = self.map.get_mut(key) {
            let previous = std::mem::replace(old, stamp);
            self.order.remove(&previous);
            self.order.insert(stamp, key.clone());
        }
    }

    fn insert(&mut self, key: K, value: V, capacity: usize) {
        let stamp = self.stamp();
        if let Some((_, previous)) = self.map.insert(key.clone(), (value, stamp)) {
            self.order.remove(&previous);
        }
        self.order.insert(stamp, key);

        while self.map.len() > capacity {
            match self.order.pop_first() {
                Some((_, old_key)) => {
                    self.map.remove(&old_key);
                    self.evictions += 1;
                }
                None => break,
            }
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> LruCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(LruCacheInner {
                map: HashMap::with_capacity(capacity),
                order: BTreeMap::new(),
                next_stamp: 0,
                generation: 0,
                evictions: 0,
            }),
        }
    }

    // Poisoned locks are recovered; the cache only holds data derived from the map.
    fn lock(&self) -> MutexGuard<'_, LruCacheInner<K, V>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let mut cache = self.lock();
        let value = cache.map.get(key).map(|(v, _)| v.clone());
        if value.is_some() {
            cache.touch(key);
        }
        value
    }

    pub fn contains(&self, key: &K) -> bool {
        self.lock().map.contains_key(key)
    }

    pub fn put(&self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        self.lock().insert(key, value, self.capacity);
    }

    /// Current removal generation
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Insert `value` unless an entry was removed or the cache cleared since `generation`.
    ///
    /// Returns whether the value was cached.
    pub fn put_if_unchanged(&self, key: K, value: V, generation: u64) -> bool {
        if self.capacity == 0 {
            return false;
        }
        let mut cache = self.lock();
        if cache.generation != generation {
            return false;
        }
        cache.insert(key, value, self.capacity);
        true
    }

    /// Remove `key`, returning whether it was cached
    pub fn remove(&self, key: &K) -> bool {
        let mut cache = self.lock();
        cache.generation += 1;
        match cache.map.remove(key) {
            Some((_, stamp)) => {
                cache.order.remove(&stamp);
                true
            }
            None => false,
        }
    }

    /// Remove every entry, returning how many were cached
    pub fn clear(&self) -> usize {
        let mut cache = self.lock();
        cache.generation += 1;
        let count = cache.map.len();
        cache.map.clear();
        cache.order.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> LruCacheStats {
        let cache = self.lock();
        LruCacheStats {
            size: cache.map.len(),
            capacity: self.capacity,
            evictions: cache.evictions,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LruCacheStats {
    pub size: usize,
    pub capacity: usize,
    pub evictions: u64,
}

impl LruCacheStats {
    /// Utilization in percent
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            (self.size as f64 / self.capacity as f64) * 100.0
        }
    }
}
