use super::{
    not_available, AdapterFuture, AdapterKind, AdapterMethod, AdapterResult, DataStructureAdapter,
};
use crate::backend::{
    DistributedMap, MapKey, MapValue, Transaction, TransactionError, TransactionOptions,
};
use crate::stats::LocalMapStats;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

const UNAVAILABLE: &[AdapterMethod] = &[
    AdapterMethod::GetAsync,
    AdapterMethod::SetAsync,
    AdapterMethod::PutAsync,
    AdapterMethod::PutIfAbsentAsync,
    AdapterMethod::RemoveAsync,
    AdapterMethod::RemoveAll,
    AdapterMethod::RemoveAllKeys,
    AdapterMethod::LocalMapStats,
];

/// Adapter that runs every operation in its own transaction on a [`DistributedMap`].
///
/// Each call begins a transaction, performs the operation inside it and commits. A failing
/// operation rolls the transaction back and returns the error. A bounded transaction
/// cannot offer fire-and-forget writes, unscoped bulk removal or map statistics, so the
/// async forms, `remove_all`, `remove_all_keys` and `local_map_stats` are unavailable.
pub struct TransactionalMapAdapter<K, V> {
    map: Arc<DistributedMap<K, V>>,
    options: TransactionOptions,
}

impl<K: MapKey, V: MapValue> TransactionalMapAdapter<K, V> {
    pub fn new(map: Arc<DistributedMap<K, V>>) -> Self {
        Self::with_options(map, TransactionOptions::default())
    }

    pub fn with_options(map: Arc<DistributedMap<K, V>>, options: TransactionOptions) -> Self {
        Self { map, options }
    }

    fn begin(&self) -> Transaction<K, V> {
        Transaction::begin(Arc::clone(&self.map), self.options.clone())
    }
}

/// Commit `tx` if the operation succeeded, roll it back otherwise
async fn complete<K: MapKey, V: MapValue, T>(
    tx: Transaction<K, V>,
    result: Result<T, TransactionError>,
) -> AdapterResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            tx.rollback();
            Err(e.into())
        }
    }
}

#[async_trait]
impl<K: MapKey, V: MapValue> DataStructureAdapter<K, V> for TransactionalMapAdapter<K, V> {
    fn kind(&self) -> AdapterKind {
        AdapterKind::TransactionalMap
    }

    fn name(&self) -> &str {
        self.map.name()
    }

    fn unavailable_methods(&self) -> &'static [AdapterMethod] {
        UNAVAILABLE
    }

    async fn get(&self, key: &K) -> AdapterResult<Option<V>> {
        let mut tx = self.begin();
        let result = tx.get(key).await;
        complete(tx, result).await
    }

    fn get_async(&self, _key: K) -> AdapterResult<AdapterFuture<Option<V>>> {
        not_available(AdapterMethod::GetAsync)
    }

    async fn set(&self, key: K, value: V) -> AdapterResult<()> {
        let mut tx = self.begin();
        let result = tx.set(key, value).await;
        complete(tx, result).await
    }

    fn set_async(&self, _key: K, _value: V) -> AdapterResult<AdapterFuture<()>> {
        not_available(AdapterMethod::SetAsync)
    }

    async fn put(&self, key: K, value: V) -> AdapterResult<Option<V>> {
        let mut tx = self.begin();
        let result = tx.put(key, value).await;
        complete(tx, result).await
    }

    fn put_async(&self, _key: K, _value: V) -> AdapterResult<AdapterFuture<Option<V>>> {
        not_available(AdapterMethod::PutAsync)
    }

    async fn put_if_absent(&self, key: K, value: V) -> AdapterResult<bool> {
        let mut tx = self.begin();
        let result = tx
            .put_if_absent(key, value)
            .await
            .map(|existing| existing.is_none());
        complete(tx, result).await
    }

    fn put_if_absent_async(&self, _key: K, _value: V) -> AdapterResult<AdapterFuture<bool>> {
        not_available(AdapterMethod::PutIfAbsentAsync)
    }

    async fn replace(&self, key: K, value: V) -> AdapterResult<Option<V>> {
        let mut tx = self.begin();
        let result = tx.replace(key, value).await;
        complete(tx, result).await
    }

    async fn replace_if_same(&self, key: K, old_value: V, new_value: V) -> AdapterResult<bool> {
        let mut tx = self.begin();
        let result = tx.replace_if_same(key, &old_value, new_value).await;
        complete(tx, result).await
    }

    async fn remove(&self, key: &K) -> AdapterResult<Option<V>> {
        let mut tx = self.begin();
        let result = tx.remove(key).await;
        complete(tx, result).await
    }

    async fn remove_if_same(&self, key: &K, value: &V) -> AdapterResult<bool> {
        let mut tx = self.begin();
        let result = tx.remove_if_same(key, value).await;
        complete(tx, result).await
    }

    fn remove_async(&self, _key: K) -> AdapterResult<AdapterFuture<Option<V>>> {
        not_available(AdapterMethod::RemoveAsync)
    }

    async fn contains_key(&self, key: &K) -> AdapterResult<bool> {
        let mut tx = self.begin();
        let result = tx.contains_key(key).await;
        complete(tx, result).await
    }

    async fn get_all(&self, keys: &HashSet<K>) -> AdapterResult<HashMap<K, V>> {
        let mut tx = self.begin();
        let result = async {
            let mut found = HashMap::with_capacity(keys.len());
            for key in keys {
                if let Some(value) = tx.get(key).await? {
                    found.insert(key.clone(), value);
                }
            }
            Ok::<_, TransactionError>(found)
        }
        .await;
        complete(tx, result).await
    }

    async fn put_all(&self, entries: HashMap<K, V>) -> AdapterResult<()> {
        let mut tx = self.begin();
        let result = async {
            for (key, value) in entries {
                tx.set(key, value).await?;
            }
            Ok::<_, TransactionError>(())
        }
        .await;
        complete(tx, result).await
    }

    async fn remove_all(&self) -> AdapterResult<()> {
        not_available(AdapterMethod::RemoveAll)
    }

    async fn remove_all_keys(&self, _keys: &HashSet<K>) -> AdapterResult<()> {
        not_available(AdapterMethod::RemoveAllKeys)
    }

    /// Delete every key visible to a fresh transaction
    async fn clear(&self) -> AdapterResult<()> {
        let mut tx = self.begin();
        let result = async {
            for key in tx.key_set()? {
                tx.delete(&key).await?;
            }
            Ok::<_, TransactionError>(())
        }
        .await;
        complete(tx, result).await
    }

    fn local_map_stats(&self) -> AdapterResult<LocalMapStats> {
        not_available(AdapterMethod::LocalMapStats)
    }
}
