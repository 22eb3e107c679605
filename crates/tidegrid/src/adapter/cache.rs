use super::{
    delegate_async, not_available, AdapterFuture, AdapterKind, AdapterMethod, AdapterResult,
    DataStructureAdapter,
};
use crate::backend::{DistributedCache, MapKey, MapValue};
use crate::stats::LocalMapStats;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

const UNAVAILABLE: &[AdapterMethod] = &[AdapterMethod::LocalMapStats];

/// Adapter over a JCache-style [`DistributedCache`].
///
/// Map-style writes that return the previous value use the cache's `get_and_*` forms. A
/// cache keeps no map statistics, so `local_map_stats` is unavailable.
pub struct CacheAdapter<K, V> {
    cache: Arc<DistributedCache<K, V>>,
}

impl<K: MapKey, V: MapValue> CacheAdapter<K, V> {
    pub fn new(cache: Arc<DistributedCache<K, V>>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl<K: MapKey, V: MapValue> DataStructureAdapter<K, V> for CacheAdapter<K, V> {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Cache
    }

    fn name(&self) -> &str {
        self.cache.name()
    }

    fn unavailable_methods(&self) -> &'static [AdapterMethod] {
        UNAVAILABLE
    }

    async fn get(&self, key: &K) -> AdapterResult<Option<V>> {
        Ok(self.cache.get(key).await?)
    }

    fn get_async(&self, key: K) -> AdapterResult<AdapterFuture<Option<V>>> {
        delegate_async(self.cache.get_async(key))
    }

    async fn set(&self, key: K, value: V) -> AdapterResult<()> {
        Ok(self.cache.put(key, value).await?)
    }

    fn set_async(&self, key: K, value: V) -> AdapterResult<AdapterFuture<()>> {
        delegate_async(self.cache.put_async(key, value))
    }

    async fn put(&self, key: K, value: V) -> AdapterResult<Option<V>> {
        Ok(self.cache.get_and_put(key, value).await?)
    }

    fn put_async(&self, key: K, value: V) -> AdapterResult<AdapterFuture<Option<V>>> {
        delegate_async(self.cache.get_and_put_async(key, value))
    }

    async fn put_if_absent(&self, key: K, value: V) -> AdapterResult<bool> {
        Ok(self.cache.put_if_absent(key, value).await?)
    }

    fn put_if_absent_async(&self, key: K, value: V) -> AdapterResult<AdapterFuture<bool>> {
        delegate_async(self.cache.put_if_absent_async(key, value))
    }

    async fn replace(&self, key: K, value: V) -> AdapterResult<Option<V>> {
        Ok(self.cache.get_and_replace(key, value).await?)
    }

    async fn replace_if_same(&self, key: K, old_value: V, new_value: V) -> AdapterResult<bool> {
        Ok(self.cache.replace_if_same(key, &old_value, new_value).await?)
    }

    async fn remove(&self, key: &K) -> AdapterResult<Option<V>> {
        Ok(self.cache.get_and_remove(key).await?)
    }

    async fn remove_if_same(&self, key: &K, value: &V) -> AdapterResult<bool> {
        Ok(self.cache.remove_if_same(key, value).await?)
    }

    fn remove_async(&self, key: K) -> AdapterResult<AdapterFuture<Option<V>>> {
        delegate_async(self.cache.get_and_remove_async(key))
    }

    async fn contains_key(&self, key: &K) -> AdapterResult<bool> {
        Ok(self.cache.contains_key(key).await?)
    }

    async fn get_all(&self, keys: &HashSet<K>) -> AdapterResult<HashMap<K, V>> {
        Ok(self.cache.get_all(keys).await?)
    }

    async fn put_all(&self, entries: HashMap<K, V>) -> AdapterResult<()> {
        Ok(self.cache.put_all(entries).await?)
    }

    async fn remove_all(&self) -> AdapterResult<()> {
        Ok(self.cache.remove_all().await?)
    }

    async fn remove_all_keys(&self, keys: &HashSet<K>) -> AdapterResult<()> {
        Ok(self.cache.remove_all_keys(keys).await?)
    }

    async fn clear(&self) -> AdapterResult<()> {
        Ok(self.cache.clear().await?)
    }

    fn local_map_stats(&self) -> AdapterResult<LocalMapStats> {
        not_available(AdapterMethod::LocalMapStats)
    }
}
