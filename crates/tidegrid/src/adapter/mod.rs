//! One interface over every map-like data structure.
//!
//! Generic test and benchmark code drives a [`DataStructureAdapter`] without knowing which
//! backend sits behind it. Operations a backend cannot offer fail with
//! [`AdapterError::MethodNotAvailable`] before the backend is touched, so callers can skip
//! them.
//!
//! # Example
//!
//! ```rust,ignore
//! let adapter = AnyAdapter::for_kind(AdapterKind::TransactionalMap, &grid, "orders")?;
//! match adapter.put_async(1, "one".to_string()) {
//!     Err(e) if e.is_method_not_available() => { /* skip */ }
//!     other => { other?.await?; }
//! }
//! ```

mod any;
mod cache;
mod map;
mod near_cache;
mod transactional;

pub use any::AnyAdapter;
pub use cache::CacheAdapter;
pub use map::MapAdapter;
pub use near_cache::NearCacheAdapter;
pub use transactional::TransactionalMapAdapter;

use crate::backend::{MapKey, MapValue};
use crate::error::AdapterError;
use crate::stats::LocalMapStats;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use tidegrid_types::StorageError;

pub type AdapterResult<T> = Result<T, AdapterError>;

/// Handle to an async-form request that is already running.
///
/// Dropping the handle does not cancel the request.
pub type AdapterFuture<T> = BoxFuture<'static, AdapterResult<T>>;

/// Every operation of [`DataStructureAdapter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterMethod {
    Get,
    GetAsync,
    Set,
    SetAsync,
    Put,
    PutAsync,
    PutIfAbsent,
    PutIfAbsentAsync,
    Replace,
    ReplaceIfSame,
    Remove,
    RemoveIfSame,
    RemoveAsync,
    ContainsKey,
    GetAll,
    PutAll,
    RemoveAll,
    RemoveAllKeys,
    Clear,
    LocalMapStats,
}

impl AdapterMethod {
    pub const ALL: [AdapterMethod; 20] = [
        AdapterMethod::Get,
        AdapterMethod::GetAsync,
        AdapterMethod::Set,
        AdapterMethod::SetAsync,
        AdapterMethod::Put,
        AdapterMethod::PutAsync,
        AdapterMethod::PutIfAbsent,
        AdapterMethod::PutIfAbsentAsync,
        AdapterMethod::Replace,
        AdapterMethod::ReplaceIfSame,
        AdapterMethod::Remove,
        AdapterMethod::RemoveIfSame,
        AdapterMethod::RemoveAsync,
        AdapterMethod::ContainsKey,
        AdapterMethod::GetAll,
        AdapterMethod::PutAll,
        AdapterMethod::RemoveAll,
        AdapterMethod::RemoveAllKeys,
        AdapterMethod::Clear,
        AdapterMethod::LocalMapStats,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AdapterMethod::Get => "get",
            AdapterMethod::GetAsync => "get_async",
            AdapterMethod::Set => "set",
            AdapterMethod::SetAsync => "set_async",
            AdapterMethod::Put => "put",
            AdapterMethod::PutAsync => "put_async",
            AdapterMethod::PutIfAbsent => "put_if_absent",
            AdapterMethod::PutIfAbsentAsync => "put_if_absent_async",
            AdapterMethod::Replace => "replace",
            AdapterMethod::ReplaceIfSame => "replace_if_same",
            AdapterMethod::Remove => "remove",
            AdapterMethod::RemoveIfSame => "remove_if_same",
            AdapterMethod::RemoveAsync => "remove_async",
            AdapterMethod::ContainsKey => "contains_key",
            AdapterMethod::GetAll => "get_all",
            AdapterMethod::PutAll => "put_all",
            AdapterMethod::RemoveAll => "remove_all",
            AdapterMethod::RemoveAllKeys => "remove_all_keys",
            AdapterMethod::Clear => "clear",
            AdapterMethod::LocalMapStats => "local_map_stats",
        }
    }

    pub fn is_async(&self) -> bool {
        matches!(
            self,
            AdapterMethod::GetAsync
                | AdapterMethod::SetAsync
                | AdapterMethod::PutAsync
                | AdapterMethod::PutIfAbsentAsync
                | AdapterMethod::RemoveAsync
        )
    }
}

impl fmt::Display for AdapterMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The backend variants an adapter can wrap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    Map,
    TransactionalMap,
    Cache,
    NearCache,
}

impl AdapterKind {
    pub const ALL: [AdapterKind; 4] = [
        AdapterKind::Map,
        AdapterKind::TransactionalMap,
        AdapterKind::Cache,
        AdapterKind::NearCache,
    ];
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AdapterKind::Map => "map",
            AdapterKind::TransactionalMap => "transactional-map",
            AdapterKind::Cache => "cache",
            AdapterKind::NearCache => "near-cache",
        };
        f.write_str(name)
    }
}

/// Uniform operations over a named map-like backend.
///
/// Supported operations forward their arguments and results unchanged and pass the
/// backend's errors through. Unsupported ones return
/// [`AdapterError::MethodNotAvailable`] without side effects; for the async forms that
/// happens when the method is called, not when the returned future is polled.
#[async_trait]
pub trait DataStructureAdapter<K: MapKey, V: MapValue>: Send + Sync {
    fn kind(&self) -> AdapterKind;

    /// Name of the wrapped data structure
    fn name(&self) -> &str;

    /// Operations this adapter rejects with `MethodNotAvailable`
    fn unavailable_methods(&self) -> &'static [AdapterMethod] {
        &[]
    }

    fn supports(&self, method: AdapterMethod) -> bool {
        !self.unavailable_methods().contains(&method)
    }

    async fn get(&self, key: &K) -> AdapterResult<Option<V>>;

    fn get_async(&self, key: K) -> AdapterResult<AdapterFuture<Option<V>>>;

    async fn set(&self, key: K, value: V) -> AdapterResult<()>;

    fn set_async(&self, key: K, value: V) -> AdapterResult<AdapterFuture<()>>;

    /// Store `value`, returning the previous value
    async fn put(&self, key: K, value: V) -> AdapterResult<Option<V>>;

    fn put_async(&self, key: K, value: V) -> AdapterResult<AdapterFuture<Option<V>>>;

    /// Store `value` if `key` is absent; returns whether it was stored
    async fn put_if_absent(&self, key: K, value: V) -> AdapterResult<bool>;

    fn put_if_absent_async(&self, key: K, value: V) -> AdapterResult<AdapterFuture<bool>>;

    /// Replace the value of an existing key, returning the previous value
    async fn replace(&self, key: K, value: V) -> AdapterResult<Option<V>>;

    /// Replace the value of `key` only if it equals `old_value`
    async fn replace_if_same(&self, key: K, old_value: V, new_value: V) -> AdapterResult<bool>;

    /// Remove `key`, returning its value
    async fn remove(&self, key: &K) -> AdapterResult<Option<V>>;

    /// Remove `key` only if its value equals `value`
    async fn remove_if_same(&self, key: &K, value: &V) -> AdapterResult<bool>;

    fn remove_async(&self, key: K) -> AdapterResult<AdapterFuture<Option<V>>>;

    async fn contains_key(&self, key: &K) -> AdapterResult<bool>;

    async fn get_all(&self, keys: &HashSet<K>) -> AdapterResult<HashMap<K, V>>;

    async fn put_all(&self, entries: HashMap<K, V>) -> AdapterResult<()>;

    /// Remove every entry
    async fn remove_all(&self) -> AdapterResult<()>;

    async fn remove_all_keys(&self, keys: &HashSet<K>) -> AdapterResult<()>;

    async fn clear(&self) -> AdapterResult<()>;

    fn local_map_stats(&self) -> AdapterResult<LocalMapStats>;
}

pub(crate) fn not_available<T>(method: AdapterMethod) -> AdapterResult<T> {
    Err(AdapterError::MethodNotAvailable(method))
}

/// Wrap a running backend request as an adapter future.
///
/// A request the backend could not start fails here, before any future is returned.
pub(crate) fn delegate_async<T, F>(
    request: Result<F, StorageError>,
) -> AdapterResult<AdapterFuture<T>>
where
    T: Send + 'static,
    F: Future<Output = Result<T, StorageError>> + Send + 'static,
{
    let request = request?;
    Ok(request.map(|result| result.map_err(AdapterError::from)).boxed())
}
