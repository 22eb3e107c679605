use super::{delegate_async, AdapterFuture, AdapterKind, AdapterResult, DataStructureAdapter};
use crate::backend::{MapKey, MapValue, NearCachedMap};
use crate::stats::LocalMapStats;
use async_trait::async_trait;
use futures::FutureExt;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Adapter over a [`NearCachedMap`]; supports every operation and reports near-cache
/// statistics alongside the map's.
pub struct NearCacheAdapter<K, V> {
    near: Arc<NearCachedMap<K, V>>,
}

impl<K: MapKey, V: MapValue> NearCacheAdapter<K, V> {
    pub fn new(near: Arc<NearCachedMap<K, V>>) -> Self {
        Self { near }
    }
}

#[async_trait]
impl<K: MapKey, V: MapValue> DataStructureAdapter<K, V> for NearCacheAdapter<K, V> {
    fn kind(&self) -> AdapterKind {
        AdapterKind::NearCache
    }

    fn name(&self) -> &str {
        self.near.name()
    }

    async fn get(&self, key: &K) -> AdapterResult<Option<V>> {
        Ok(self.near.get(key).await?)
    }

    fn get_async(&self, key: K) -> AdapterResult<AdapterFuture<Option<V>>> {
        delegate_async(self.near.get_async(key))
    }

    async fn set(&self, key: K, value: V) -> AdapterResult<()> {
        Ok(self.near.set(key, value).await?)
    }

    fn set_async(&self, key: K, value: V) -> AdapterResult<AdapterFuture<()>> {
        delegate_async(self.near.set_async(key, value))
    }

    async fn put(&self, key: K, value: V) -> AdapterResult<Option<V>> {
        Ok(self.near.put(key, value).await?)
    }

    fn put_async(&self, key: K, value: V) -> AdapterResult<AdapterFuture<Option<V>>> {
        delegate_async(self.near.put_async(key, value))
    }

    async fn put_if_absent(&self, key: K, value: V) -> AdapterResult<bool> {
        Ok(self.near.put_if_absent(key, value).await?.is_none())
    }

    fn put_if_absent_async(&self, key: K, value: V) -> AdapterResult<AdapterFuture<bool>> {
        let request = self.near.put_if_absent_async(key, value)?;
        delegate_async(Ok(request.map(|result| result.map(|existing| existing.is_none()))))
    }

    async fn replace(&self, key: K, value: V) -> AdapterResult<Option<V>> {
        Ok(self.near.replace(key, value).await?)
    }

    async fn replace_if_same(&self, key: K, old_value: V, new_value: V) -> AdapterResult<bool> {
        Ok(self.near.replace_if_same(key, &old_value, new_value).await?)
    }

    async fn remove(&self, key: &K) -> AdapterResult<Option<V>> {
        Ok(self.near.remove(key).await?)
    }

    async fn remove_if_same(&self, key: &K, value: &V) -> AdapterResult<bool> {
        Ok(self.near.remove_if_same(key, value).await?)
    }

    fn remove_async(&self, key: K) -> AdapterResult<AdapterFuture<Option<V>>> {
        delegate_async(self.near.remove_async(key))
    }

    async fn contains_key(&self, key: &K) -> AdapterResult<bool> {
        Ok(self.near.contains_key(key).await?)
    }

    async fn get_all(&self, keys: &HashSet<K>) -> AdapterResult<HashMap<K, V>> {
        Ok(self.near.get_all(keys).await?)
    }

    async fn put_all(&self, entries: HashMap<K, V>) -> AdapterResult<()> {
        Ok(self.near.put_all(entries).await?)
    }

    async fn remove_all(&self) -> AdapterResult<()> {
        Ok(self.near.remove_all().await?)
    }

    async fn remove_all_keys(&self, keys: &HashSet<K>) -> AdapterResult<()> {
        Ok(self.near.remove_all_keys(keys).await?)
    }

    async fn clear(&self) -> AdapterResult<()> {
        Ok(self.near.clear().await?)
    }

    fn local_map_stats(&self) -> AdapterResult<LocalMapStats> {
        Ok(self.near.local_map_stats())
    }
}
