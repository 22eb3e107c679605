use super::{
    AdapterFuture, AdapterKind, AdapterMethod, AdapterResult, CacheAdapter, DataStructureAdapter,
    MapAdapter, NearCacheAdapter, TransactionalMapAdapter,
};
use crate::backend::{MapKey, MapValue};
use crate::instance::{GridInstance, DEFAULT_NEAR_CACHE_CAPACITY};
use crate::stats::LocalMapStats;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tidegrid_types::StorageError;

/// Any of the adapters, selected at runtime by [`AdapterKind`]
pub enum AnyAdapter<K, V> {
    Map(MapAdapter<K, V>),
    TransactionalMap(TransactionalMapAdapter<K, V>),
    Cache(CacheAdapter<K, V>),
    NearCache(NearCacheAdapter<K, V>),
}

macro_rules! dispatch {
    ($self:ident, $adapter:ident => $call:expr) => {
        match $self {
            AnyAdapter::Map($adapter) => $call,
            AnyAdapter::TransactionalMap($adapter) => $call,
            AnyAdapter::Cache($adapter) => $call,
            AnyAdapter::NearCache($adapter) => $call,
        }
    };
}

impl<K: MapKey, V: MapValue> AnyAdapter<K, V> {
    /// Adapter of `kind` over the data structure `name` of `grid`.
    ///
    /// Map, transactional map and near cache adapters with the same name share one map.
    pub fn for_kind(kind: AdapterKind, grid: &GridInstance, name: &str) -> Result<Self, StorageError> {
        let adapter = match kind {
            AdapterKind::Map => AnyAdapter::Map(MapAdapter::new(grid.get_map(name)?)),
            AdapterKind::TransactionalMap => {
                AnyAdapter::TransactionalMap(TransactionalMapAdapter::new(grid.get_map(name)?))
            }
            AdapterKind::Cache => AnyAdapter::Cache(CacheAdapter::new(grid.get_cache(name)?)),
            AdapterKind::NearCache => AnyAdapter::NearCache(NearCacheAdapter::new(
                grid.get_near_cached_map(name, DEFAULT_NEAR_CACHE_CAPACITY)?,
            )),
        };
        Ok(adapter)
    }
}

impl<K, V> From<MapAdapter<K, V>> for AnyAdapter<K, V> {
    fn from(adapter: MapAdapter<K, V>) -> Self {
        AnyAdapter::Map(adapter)
    }
}

impl<K, V> From<TransactionalMapAdapter<K, V>> for AnyAdapter<K, V> {
    fn from(adapter: TransactionalMapAdapter<K, V>) -> Self {
        AnyAdapter::TransactionalMap(adapter)
    }
}

impl<K, V> From<CacheAdapter<K, V>> for AnyAdapter<K, V> {
    fn from(adapter: CacheAdapter<K, V>) -> Self {
        AnyAdapter::Cache(adapter)
    }
}

impl<K, V> From<NearCacheAdapter<K, V>> for AnyAdapter<K, V> {
    fn from(adapter: NearCacheAdapter<K, V>) -> Self {
        AnyAdapter::NearCache(adapter)
    }
}

#[async_trait]
impl<K: MapKey, V: MapValue> DataStructureAdapter<K, V> for AnyAdapter<K, V> {
    fn kind(&self) -> AdapterKind {
        dispatch!(self, a => a.kind())
    }

    fn name(&self) -> &str {
        dispatch!(self, a => a.name())
    }

    fn unavailable_methods(&self) -> &'static [AdapterMethod] {
        dispatch!(self, a => a.unavailable_methods())
    }

    async fn get(&self, key: &K) -> AdapterResult<Option<V>> {
        dispatch!(self, a => a.get(key).await)
    }

    fn get_async(&self, key: K) -> AdapterResult<AdapterFuture<Option<V>>> {
        dispatch!(self, a => a.get_async(key))
    }

    async fn set(&self, key: K, value: V) -> AdapterResult<()> {
        dispatch!(self, a => a.set(key, value).await)
    }

    fn set_async(&self, key: K, value: V) -> AdapterResult<AdapterFuture<()>> {
        dispatch!(self, a => a.set_async(key, value))
    }

    async fn put(&self, key: K, value: V) -> AdapterResult<Option<V>> {
        dispatch!(self, a => a.put(key, value).await)
    }

    fn put_async(&self, key: K, value: V) -> AdapterResult<AdapterFuture<Option<V>>> {
        dispatch!(self, a => a.put_async(key, value))
    }

    async fn put_if_absent(&self, key: K, value: V) -> AdapterResult<bool> {
        dispatch!(self, a => a.put_if_absent(key, value).await)
    }

    fn put_if_absent_async(&self, key: K, value: V) -> AdapterResult<AdapterFuture<bool>> {
        dispatch!(self, a => a.put_if_absent_async(key, value))
    }

    async fn replace(&self, key: K, value: V) -> AdapterResult<Option<V>> {
        dispatch!(self, a => a.replace(key, value).await)
    }

    async fn replace_if_same(&self, key: K, old_value: V, new_value: V) -> AdapterResult<bool> {
        dispatch!(self, a => a.replace_if_same(key, old_value, new_value).await)
    }

    async fn remove(&self, key: &K) -> AdapterResult<Option<V>> {
        dispatch!(self, a => a.remove(key).await)
    }

    async fn remove_if_same(&self, key: &K, value: &V) -> AdapterResult<bool> {
        dispatch!(self, a => a.remove_if_same(key, value).await)
    }

    fn remove_async(&self, key: K) -> AdapterResult<AdapterFuture<Option<V>>> {
        dispatch!(self, a => a.remove_async(key))
    }

    async fn contains_key(&self, key: &K) -> AdapterResult<bool> {
        dispatch!(self, a => a.contains_key(key).await)
    }

    async fn get_all(&self, keys: &HashSet<K>) -> AdapterResult<HashMap<K, V>> {
        dispatch!(self, a => a.get_all(keys).await)
    }

    async fn put_all(&self, entries: HashMap<K, V>) -> AdapterResult<()> {
        dispatch!(self, a => a.put_all(entries).await)
    }

    async fn remove_all(&self) -> AdapterResult<()> {
        dispatch!(self, a => a.remove_all().await)
    }

    async fn remove_all_keys(&self, keys: &HashSet<K>) -> AdapterResult<()> {
        dispatch!(self, a => a.remove_all_keys(keys).await)
    }

    async fn clear(&self) -> AdapterResult<()> {
        dispatch!(self, a => a.clear().await)
    }

    fn local_map_stats(&self) -> AdapterResult<LocalMapStats> {
        dispatch!(self, a => a.local_map_stats())
    }
}
