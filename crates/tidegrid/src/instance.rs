use crate::backend::{
    DistributedCache, DistributedMap, MapKey, MapValue, NearCachedMap, Transaction,
    TransactionOptions,
};
use dashmap::DashMap;
use std::any::Any;
use std::sync::Arc;
use tidegrid_types::{ClusterConfig, ConfigError, QueueConfig, StorageError};
use tracing::{debug, info};

/// Local-tier capacity used by [`GridInstance::get_near_cached_map`]
pub const DEFAULT_NEAR_CACHE_CAPACITY: usize = 10_000;

type Registry = DashMap<String, Arc<dyn Any + Send + Sync>>;

/// A member of the grid holding named data structures.
///
/// Asking twice for the same name returns the same backend. Asking for an existing name
/// with different key or value types fails with [`StorageError::TypeMismatch`].
pub struct GridInstance {
    config: ClusterConfig,
    maps: Registry,
    caches: Registry,
    near_caches: Registry,
}

impl GridInstance {
    /// Start an instance after validating `config`
    pub fn new(config: ClusterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            cluster = %config.cluster_name,
            queues = config.queue_configs().count(),
            "Grid instance started"
        );
        Ok(Self {
            config,
            maps: DashMap::new(),
            caches: DashMap::new(),
            near_caches: DashMap::new(),
        })
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Effective configuration of the queue `name`
    pub fn queue_config(&self, name: &str) -> QueueConfig {
        self.config.derive_queue_config(name)
    }

    pub fn get_map<K: MapKey, V: MapValue>(
        &self,
        name: &str,
    ) -> Result<Arc<DistributedMap<K, V>>, StorageError> {
        lookup(&self.maps, name, "map", || DistributedMap::<K, V>::new(name))
    }

    pub fn get_cache<K: MapKey, V: MapValue>(
        &self,
        name: &str,
    ) -> Result<Arc<DistributedCache<K, V>>, StorageError> {
        lookup(&self.caches, name, "cache", || DistributedCache::<K, V>::new(name))
    }

    /// Near-cached view of the map `name`.
    ///
    /// `capacity` only applies when the view is first created.
    pub fn get_near_cached_map<K: MapKey, V: MapValue>(
        &self,
        name: &str,
        capacity: usize,
    ) -> Result<Arc<NearCachedMap<K, V>>, StorageError> {
        let map = self.get_map::<K, V>(name)?;
        lookup(&self.near_caches, name, "near cache", || {
            NearCachedMap::new(map, capacity)
        })
    }

    /// Begin a transaction on the map `name`
    pub fn begin_transaction<K: MapKey, V: MapValue>(
        &self,
        name: &str,
        options: TransactionOptions,
    ) -> Result<Transaction<K, V>, StorageError> {
        Ok(Transaction::begin(self.get_map(name)?, options))
    }
}

fn lookup<T, F>(registry: &Registry, name: &str, kind: &str, create: F) -> Result<Arc<T>, StorageError>
where
    T: Any + Send + Sync,
    F: FnOnce() -> T,
{
    let entry = registry
        .entry(name.to_string())
        .or_insert_with(|| {
            debug!(structure = name, kind, "Created data structure");
            Arc::new(create()) as Arc<dyn Any + Send + Sync>
        })
        .value()
        .clone();
    entry.downcast::<T>().map_err(|_| StorageError::TypeMismatch {
        name: name.to_string(),
    })
}
