use super::{spawn_backend_op, BackendFuture, BackendResult, MapKey, MapValue};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Named cache with JCache-style operations.
///
/// Unlike [`super::DistributedMap`], plain writes return nothing and the value-returning
/// forms are spelled `get_and_*`. Conditional writes report success as a boolean.
pub struct DistributedCache<K, V> {
    name: String,
    entries: DashMap<K, V>,
}

impl<K: MapKey, V: MapValue> DistributedCache<K, V> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: DashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub async fn get(&self, key: &K) -> BackendResult<Option<V>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    pub async fn put(&self, key: K, value: V) -> BackendResult<()> {
        self.entries.insert(key, value);
        Ok(())
    }

    pub async fn get_and_put(&self, key: K, value: V) -> BackendResult<Option<V>> {
        Ok(self.entries.insert(key, value))
    }

    /// Store `value` if `key` is absent; returns whether it was stored
    pub async fn put_if_absent(&self, key: K, value: V) -> BackendResult<bool> {
        match self.entries.entry(key) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(entry) => {
                entry.insert(value);
                Ok(true)
            }
        }
    }

    /// Replace the value of an existing key; returns whether it was replaced
    pub async fn replace(&self, key: K, value: V) -> BackendResult<bool> {
        Ok(self.get_and_replace(key, value).await?.is_some())
    }

    pub async fn get_and_replace(&self, key: K, value: V) -> BackendResult<Option<V>> {
        match self.entries.entry(key) {
            Entry::Occupied(mut entry) => Ok(Some(entry.insert(value))),
            Entry::Vacant(_) => Ok(None),
        }
    }

    pub async fn replace_if_same(&self, key: K, expected: &V, value: V) -> BackendResult<bool> {
        match self.entries.get_mut(&key) {
            Some(mut current) if *current == *expected => {
                *current = value;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Remove `key`; returns whether it was present
    pub async fn remove(&self, key: &K) -> BackendResult<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    pub async fn remove_if_same(&self, key: &K, expected: &V) -> BackendResult<bool> {
        Ok(self
            .entries
            .remove_if(key, |_, current| current == expected)
            .is_some())
    }

    pub async fn get_and_remove(&self, key: &K) -> BackendResult<Option<V>> {
        Ok(self.entries.remove(key).map(|(_, v)| v))
    }

    pub async fn contains_key(&self, key: &K) -> BackendResult<bool> {
        Ok(self.entries.contains_key(key))
    }

    pub async fn get_all(&self, keys: &HashSet<K>) -> BackendResult<HashMap<K, V>> {
        Ok(keys
            .iter()
            .filter_map(|key| {
                self.entries
                    .get(key)
                    .map(|v| (key.clone(), v.value().clone()))
            })
            .collect())
    }

    pub async fn put_all(&self, entries: HashMap<K, V>) -> BackendResult<()> {
        for (key, value) in entries {
            self.entries.insert(key, value);
        }
        Ok(())
    }

    /// Remove every entry one by one, as an entry-level removal
    pub async fn remove_all(&self) -> BackendResult<()> {
        let keys: Vec<K> = self.entries.iter().map(|e| e.key().clone()).collect();
        for key in keys {
            self.entries.remove(&key);
        }
        Ok(())
    }

    pub async fn remove_all_keys(&self, keys: &HashSet<K>) -> BackendResult<()> {
        for key in keys {
            self.entries.remove(key);
        }
        Ok(())
    }

    /// Drop every entry at once
    pub async fn clear(&self) -> BackendResult<()> {
        self.entries.clear();
        Ok(())
    }

    pub fn get_async(self: &Arc<Self>, key: K) -> BackendResult<BackendFuture<Option<V>>> {
        let cache = Arc::clone(self);
        spawn_backend_op(async move { cache.get(&key).await })
    }

    pub fn put_async(self: &Arc<Self>, key: K, value: V) -> BackendResult<BackendFuture<()>> {
        let cache = Arc::clone(self);
        spawn_backend_op(async move { cache.put(key, value).await })
    }

    pub fn get_and_put_async(self: &Arc<Self>, key: K, value: V) -> BackendResult<BackendFuture<Option<V>>> {
        let cache = Arc::clone(self);
        spawn_backend_op(async move { cache.get_and_put(key, value).await })
    }

    pub fn put_if_absent_async(self: &Arc<Self>, key: K, value: V) -> BackendResult<BackendFuture<bool>> {
        let cache = Arc::clone(self);
        spawn_backend_op(async move { cache.put_if_absent(key, value).await })
    }

    pub fn get_and_remove_async(self: &Arc<Self>, key: K) -> BackendResult<BackendFuture<Option<V>>> {
        let cache = Arc::clone(self);
        spawn_backend_op(async move { cache.get_and_remove(&key).await })
    }
}

impl<K: MapKey, V: MapValue> fmt::Debug for DistributedCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistributedCache")
            .field("name", &self.name)
            .field("size", &self.size())
            .finish()
    }
}
