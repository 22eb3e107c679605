use super::{delegate_async, AdapterFuture, AdapterKind, AdapterResult, DataStructureAdapter};
use crate::backend::{DistributedMap, MapKey, MapValue};
use crate::stats::LocalMapStats;
use async_trait::async_trait;
use futures::FutureExt;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Adapter over a plain [`DistributedMap`]; supports every operation
pub struct MapAdapter<K, V> {
    map: Arc<DistributedMap<K, V>>,
}

impl<K: MapKey, V: MapValue> MapAdapter<K, V> {
    pub fn new(map: Arc<DistributedMap<K, V>>) -> Self {
        Self { map }
    }
}

#[async_trait]
impl<K: MapKey, V: MapValue> DataStructureAdapter<K, V> for MapAdapter<K, V> {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Map
    }

    fn name(&self) -> &str {
        self.map.name()
    }

    async fn get(&self, key: &K) -> AdapterResult<Option<V>> {
        Ok(self.map.get(key).await?)
    }

    fn get_async(&self, key: K) -> AdapterResult<AdapterFuture<Option<V>>> {
        delegate_async(self.map.get_async(key))
    }

    async fn set(&self, key: K, value: V) -> AdapterResult<()> {
        Ok(self.map.set(key, value).await?)
    }

    fn set_async(&self, key: K, value: V) -> AdapterResult<AdapterFuture<()>> {
        delegate_async(self.map.set_async(key, value))
    }

    async fn put(&self, key: K, value: V) -> AdapterResult<Option<V>> {
        Ok(self.map.put(key, value).await?)
    }

    fn put_async(&self, key: K, value: V) -> AdapterResult<AdapterFuture<Option<V>>> {
        delegate_async(self.map.put_async(key, value))
    }

    async fn put_if_absent(&self, key: K, value: V) -> AdapterResult<bool> {
        Ok(self.map.put_if_absent(key, value).await?.is_none())
    }

    fn put_if_absent_async(&self, key: K, value: V) -> AdapterResult<AdapterFuture<bool>> {
        let request = self.map.put_if_absent_async(key, value)?;
        delegate_async(Ok(request.map(|result| result.map(|existing| existing.is_none()))))
    }

    async fn replace(&self, key: K, value: V) -> AdapterResult<Option<V>> {
        Ok(self.map.replace(key, value).await?)
    }

    async fn replace_if_same(&self, key: K, old_value: V, new_value: V) -> AdapterResult<bool> {
        Ok(self.map.replace_if_same(key, &old_value, new_value).await?)
    }

    async fn remove(&self, key: &K) -> AdapterResult<Option<V>> {
        Ok(self.map.remove(key).await?)
    }

    async fn remove_if_same(&self, key: &K, value: &V) -> AdapterResult<bool> {
        Ok(self.map.remove_if_same(key, value).await?)
    }

    fn remove_async(&self, key: K) -> AdapterResult<AdapterFuture<Option<V>>> {
        delegate_async(self.map.remove_async(key))
    }

    async fn contains_key(&self, key: &K) -> AdapterResult<bool> {
        Ok(self.map.contains_key(key).await?)
    }

    async fn get_all(&self, keys: &HashSet<K>) -> AdapterResult<HashMap<K, V>> {
        Ok(self.map.get_all(keys).await?)
    }

    async fn put_all(&self, entries: HashMap<K, V>) -> AdapterResult<()> {
        Ok(self.map.put_all(entries).await?)
    }

    async fn remove_all(&self) -> AdapterResult<()> {
        Ok(self.map.clear().await?)
    }

    async fn remove_all_keys(&self, keys: &HashSet<K>) -> AdapterResult<()> {
        Ok(self.map.remove_all(keys).await?)
    }

    async fn clear(&self) -> AdapterResult<()> {
        Ok(self.map.clear().await?)
    }

    fn local_map_stats(&self) -> AdapterResult<LocalMapStats> {
        Ok(self.map.local_map_stats())
    }
}
