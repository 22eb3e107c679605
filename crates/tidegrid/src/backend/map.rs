use super::{spawn_backend_op, BackendFuture, BackendResult, MapKey, MapValue};
use crate::stats::{LocalMapStats, MapStatsCounters};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Concurrent named map living on the local member.
///
/// Every single-key operation is atomic for its key. Batch operations process keys one at a
/// time and are not atomic across keys. Transactions commit through
/// [`DistributedMap::apply_writes`] while holding the commit lock.
pub struct DistributedMap<K, V> {
    name: String,
    entries: DashMap<K, V>,
    stats: MapStatsCounters,
    commit_lock: Mutex<()>,
}

impl<K: MapKey, V: MapValue> DistributedMap<K, V> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: DashMap::new(),
            stats: MapStatsCounters::new(),
            commit_lock: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the keys currently present
    pub fn key_set(&self) -> HashSet<K> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    pub async fn get(&self, key: &K) -> BackendResult<Option<V>> {
        let value = self.entries.get(key).map(|v| v.value().clone());
        self.stats.record_get(value.is_some());
        Ok(value)
    }

    /// Store `value`, returning the previous value
    pub async fn put(&self, key: K, value: V) -> BackendResult<Option<V>> {
        let previous = self.entries.insert(key, value);
        self.stats.record_put();
        Ok(previous)
    }

    /// Store `value` without returning the previous value
    pub async fn set(&self, key: K, value: V) -> BackendResult<()> {
        self.entries.insert(key, value);
        self.stats.record_put();
        Ok(())
    }

    /// Store `value` only if `key` is absent; returns the existing value otherwise
    pub async fn put_if_absent(&self, key: K, value: V) -> BackendResult<Option<V>> {
        let existing = match self.entries.entry(key) {
            Entry::Occupied(entry) => Some(entry.get().clone()),
            Entry::Vacant(entry) => {
                entry.insert(value);
                None
            }
        };
        self.stats.record_put();
        Ok(existing)
    }

    /// Replace the value of an existing key, returning the previous value
    pub async fn replace(&self, key: K, value: V) -> BackendResult<Option<V>> {
        let previous = match self.entries.entry(key) {
            Entry::Occupied(mut entry) => Some(entry.insert(value)),
            Entry::Vacant(_) => None,
        };
        self.stats.record_put();
        Ok(previous)
    }

    /// Replace the value of `key` only if it currently equals `expected`
    pub async fn replace_if_same(&self, key: K, expected: &V, value: V) -> BackendResult<bool> {
        let replaced = match self.entries.get_mut(&key) {
            Some(mut current) if *current == *expected => {
                *current = value;
                true
            }
            _ => false,
        };
        self.stats.record_put();
        Ok(replaced)
    }

    /// Remove `key`, returning its value
    pub async fn remove(&self, key: &K) -> BackendResult<Option<V>> {
        let previous = self.entries.remove(key).map(|(_, v)| v);
        self.stats.record_remove();
        Ok(previous)
    }

    /// Remove `key` only if its value equals `expected`
    pub async fn remove_if_same(&self, key: &K, expected: &V) -> BackendResult<bool> {
        let removed = self
            .entries
            .remove_if(key, |_, current| current == expected)
            .is_some();
        self.stats.record_remove();
        Ok(removed)
    }

    /// Remove `key` without returning its value
    pub async fn delete(&self, key: &K) -> BackendResult<()> {
        self.entries.remove(key);
        self.stats.record_remove();
        Ok(())
    }

    pub async fn contains_key(&self, key: &K) -> BackendResult<bool> {
        self.stats.record_other(false);
        Ok(self.entries.contains_key(key))
    }

    /// Values of the requested keys that are present
    pub async fn get_all(&self, keys: &HashSet<K>) -> BackendResult<HashMap<K, V>> {
        let mut result = HashMap::with_capacity(keys.len());
        for key in keys {
            let value = self.entries.get(key).map(|v| v.value().clone());
            self.stats.record_get(value.is_some());
            if let Some(value) = value {
                result.insert(key.clone(), value);
            }
        }
        Ok(result)
    }

    pub async fn put_all(&self, entries: HashMap<K, V>) -> BackendResult<()> {
        for (key, value) in entries {
            self.entries.insert(key, value);
            self.stats.record_put();
        }
        Ok(())
    }

    /// Remove every key in `keys`
    pub async fn remove_all(&self, keys: &HashSet<K>) -> BackendResult<()> {
        for key in keys {
            self.entries.remove(key);
            self.stats.record_remove();
        }
        Ok(())
    }

    pub async fn clear(&self) -> BackendResult<()> {
        self.entries.clear();
        self.stats.record_other(true);
        Ok(())
    }

    pub fn local_map_stats(&self) -> LocalMapStats {
        self.stats.snapshot(self.entries.len() as u64)
    }

    pub fn get_async(self: &Arc<Self>, key: K) -> BackendResult<BackendFuture<Option<V>>> {
        let map = Arc::clone(self);
        spawn_backend_op(async move { map.get(&key).await })
    }

    pub fn put_async(self: &Arc<Self>, key: K, value: V) -> BackendResult<BackendFuture<Option<V>>> {
        let map = Arc::clone(self);
        spawn_backend_op(async move { map.put(key, value).await })
    }

    pub fn set_async(self: &Arc<Self>, key: K, value: V) -> BackendResult<BackendFuture<()>> {
        let map = Arc::clone(self);
        spawn_backend_op(async move { map.set(key, value).await })
    }

    pub fn put_if_absent_async(self: &Arc<Self>, key: K, value: V) -> BackendResult<BackendFuture<Option<V>>> {
        let map = Arc::clone(self);
        spawn_backend_op(async move { map.put_if_absent(key, value).await })
    }

    pub fn remove_async(self: &Arc<Self>, key: K) -> BackendResult<BackendFuture<Option<V>>> {
        let map = Arc::clone(self);
        spawn_backend_op(async move { map.remove(&key).await })
    }

    /// Serialises transaction commits against each other
    pub(crate) async fn lock_commits(&self) -> MutexGuard<'_, ()> {
        self.commit_lock.lock().await
    }

    /// Apply a transaction's buffered writes; `None` deletes the key.
    ///
    /// Callers hold the guard from [`DistributedMap::lock_commits`].
    pub(crate) fn apply_writes(&self, writes: Vec<(K, Option<V>)>) {
        for (key, value) in writes {
            match value {
                Some(value) => {
                    self.entries.insert(key, value);
                    self.stats.record_put();
                }
                None => {
                    self.entries.remove(&key);
                    self.stats.record_remove();
                }
            }
        }
    }

    /// Current value without touching statistics
    pub(crate) fn peek(&self, key: &K) -> Option<V> {
        self.entries.get(key).map(|v| v.value().clone())
    }
}

impl<K: MapKey, V: MapValue> fmt::Debug for DistributedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistributedMap")
            .field("name", &self.name)
            .field("size", &self.size())
            .finish()
    }
}
