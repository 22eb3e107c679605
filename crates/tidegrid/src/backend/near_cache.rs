use super::{spawn_backend_op, BackendFuture, BackendResult, DistributedMap, LruCache, MapKey, MapValue};
use crate::stats::{LocalMapStats, NearCacheCounters};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::trace;

/// A [`DistributedMap`] fronted by a local LRU tier.
///
/// Reads are served from the local tier when possible and populate it on a miss. Every write
/// through this handle goes to the backing map first and then invalidates the local copy of
/// the key, so a later read always observes the write. A read that misses only installs
/// what it fetched if no invalidation happened while it was reading the map. Writes made directly on the backing
/// map are not seen by the local tier until the entry is evicted or invalidated.
pub struct NearCachedMap<K, V> {
    map: Arc<DistributedMap<K, V>>,
    near_cache: LruCache<K, V>,
    counters: NearCacheCounters,
}

impl<K: MapKey, V: MapValue> NearCachedMap<K, V> {
    pub fn new(map: Arc<DistributedMap<K, V>>, capacity: usize) -> Self {
        Self {
            map,
            near_cache: LruCache::new(capacity),
            counters: NearCacheCounters::default(),
        }
    }

    pub fn name(&self) -> &str {
        self.map.name()
    }

    pub fn backing_map(&self) -> &Arc<DistributedMap<K, V>> {
        &self.map
    }

    /// Number of entries held in the local tier
    pub fn near_cache_size(&self) -> usize {
        self.near_cache.len()
    }

    fn invalidate(&self, key: &K) {
        if self.near_cache.remove(key) {
            self.counters.record_invalidations(1);
        }
    }

    fn invalidate_all(&self) {
        let dropped = self.near_cache.clear();
        if dropped > 0 {
            trace!(map = %self.name(), dropped, "Near cache cleared");
            self.counters.record_invalidations(dropped as u64);
        }
    }

    pub async fn get(&self, key: &K) -> BackendResult<Option<V>> {
        if let Some(value) = self.near_cache.get(key) {
            self.counters.record_hit();
            return Ok(Some(value));
        }
        self.counters.record_miss();

        // An invalidation racing with the map read leaves the local tier untouched
        let generation = self.near_cache.generation();
        let value = self.map.get(key).await?;
        if let Some(value) = &value {
            self.near_cache.put_if_unchanged(key.clone(), value.clone(), generation);
        }
        Ok(value)
    }

    pub async fn put(&self, key: K, value: V) -> BackendResult<Option<V>> {
        let previous = self.map.put(key.clone(), value).await?;
        self.invalidate(&key);
        Ok(previous)
    }

    pub async fn set(&self, key: K, value: V) -> BackendResult<()> {
        self.map.set(key.clone(), value).await?;
        self.invalidate(&key);
        Ok(())
    }

    pub async fn put_if_absent(&self, key: K, value: V) -> BackendResult<Option<V>> {
        let existing = self.map.put_if_absent(key.clone(), value).await?;
        self.invalidate(&key);
        Ok(existing)
    }

    pub async fn replace(&self, key: K, value: V) -> BackendResult<Option<V>> {
        let previous = self.map.replace(key.clone(), value).await?;
        self.invalidate(&key);
        Ok(previous)
    }

    pub async fn replace_if_same(&self, key: K, expected: &V, value: V) -> BackendResult<bool> {
        let replaced = self.map.replace_if_same(key.clone(), expected, value).await?;
        self.invalidate(&key);
        Ok(replaced)
    }

    pub async fn remove(&self, key: &K) -> BackendResult<Option<V>> {
        let previous = self.map.remove(key).await?;
        self.invalidate(key);
        Ok(previous)
    }

    pub async fn remove_if_same(&self, key: &K, expected: &V) -> BackendResult<bool> {
        let removed = self.map.remove_if_same(key, expected).await?;
        self.invalidate(key);
        Ok(removed)
    }

    pub async fn contains_key(&self, key: &K) -> BackendResult<bool> {
        if self.near_cache.contains(key) {
            return Ok(true);
        }
        self.map.contains_key(key).await
    }

    /// Serve what the local tier holds and fetch the rest from the backing map
    pub async fn get_all(&self, keys: &HashSet<K>) -> BackendResult<HashMap<K, V>> {
        let mut result = HashMap::with_capacity(keys.len());
        let mut missing = HashSet::new();
        for key in keys {
            match self.near_cache.get(key) {
                Some(value) => {
                    self.counters.record_hit();
                    result.insert(key.clone(), value);
                }
                None => {
                    self.counters.record_miss();
                    missing.insert(key.clone());
                }
            }
        }

        if !missing.is_empty() {
            let generation = self.near_cache.generation();
            let fetched = self.map.get_all(&missing).await?;
            for (key, value) in fetched {
                self.near_cache.put_if_unchanged(key.clone(), value.clone(), generation);
                result.insert(key, value);
            }
        }
        Ok(result)
    }

    pub async fn put_all(&self, entries: HashMap<K, V>) -> BackendResult<()> {
        let keys: Vec<K> = entries.keys().cloned().collect();
        self.map.put_all(entries).await?;
        for key in &keys {
            self.invalidate(key);
        }
        Ok(())
    }

    /// Remove every entry of the backing map
    pub async fn remove_all(&self) -> BackendResult<()> {
        let keys = self.map.key_set();
        self.map.remove_all(&keys).await?;
        self.invalidate_all();
        Ok(())
    }

    pub async fn remove_all_keys(&self, keys: &HashSet<K>) -> BackendResult<()> {
        self.map.remove_all(keys).await?;
        for key in keys {
            self.invalidate(key);
        }
        Ok(())
    }

    pub async fn clear(&self) -> BackendResult<()> {
        self.map.clear().await?;
        self.invalidate_all();
        Ok(())
    }

    /// Backing map statistics with the local tier's statistics attached
    pub fn local_map_stats(&self) -> LocalMapStats {
        let mut stats = self.map.local_map_stats();
        let lru = self.near_cache.stats();
        stats.near_cache_stats = Some(self.counters.snapshot(lru.size as u64, lru.evictions));
        stats
    }

    pub fn get_async(self: &Arc<Self>, key: K) -> BackendResult<BackendFuture<Option<V>>> {
        let near = Arc::clone(self);
        spawn_backend_op(async move { near.get(&key).await })
    }

    pub fn put_async(self: &Arc<Self>, key: K, value: V) -> BackendResult<BackendFuture<Option<V>>> {
        let near = Arc::clone(self);
        spawn_backend_op(async move { near.put(key, value).await })
    }

    pub fn set_async(self: &Arc<Self>, key: K, value: V) -> BackendResult<BackendFuture<()>> {
        let near = Arc::clone(self);
        spawn_backend_op(async move { near.set(key, value).await })
    }

    pub fn put_if_absent_async(self: &Arc<Self>, key: K, value: V) -> BackendResult<BackendFuture<Option<V>>> {
        let near = Arc::clone(self);
        spawn_backend_op(async move { near.put_if_absent(key, value).await })
    }

    pub fn remove_async(self: &Arc<Self>, key: K) -> BackendResult<BackendFuture<Option<V>>> {
        let near = Arc::clone(self);
        spawn_backend_op(async move { near.remove(&key).await })
    }
}
