//! In-process reference backends.
//!
//! These stand in for the cluster's data structures: a concurrent map, transactions over a
//! map, a JCache-style cache and a near-cached map. They keep everything on the local member
//! and do not replicate.

pub mod cache;
pub mod lru;
pub mod map;
pub mod near_cache;
pub mod transaction;

pub use cache::DistributedCache;
pub use lru::{LruCache, LruCacheStats};
pub use map::DistributedMap;
pub use near_cache::NearCachedMap;
pub use transaction::{
    IsolationLevel, Transaction, TransactionError, TransactionOptions, TransactionStatus,
};

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::hash::Hash;
use tidegrid_types::StorageError;
use tokio::runtime::Handle;

/// Bounds for keys stored in a backend
pub trait MapKey: Eq + Hash + Clone + Send + Sync + 'static {}

impl<T> MapKey for T where T: Eq + Hash + Clone + Send + Sync + 'static {}

/// Bounds for values stored in a backend
pub trait MapValue: Clone + PartialEq + Send + Sync + 'static {}

impl<T> MapValue for T where T: Clone + PartialEq + Send + Sync + 'static {}

pub type BackendResult<T> = Result<T, StorageError>;

/// Handle to a backend request that is already running.
pub type BackendFuture<T> = BoxFuture<'static, BackendResult<T>>;

/// Start `op` on the current tokio runtime and return a handle to its result.
///
/// The request runs whether or not the handle is polled or kept. Without a runtime nothing is
/// started and the call fails with [`StorageError::Internal`].
pub(crate) fn spawn_backend_op<T, F>(op: F) -> BackendResult<BackendFuture<T>>
where
    T: Send + 'static,
    F: Future<Output = BackendResult<T>> + Send + 'static,
{
    let runtime = Handle::try_current().map_err(|e| {
        StorageError::Internal(format!("no runtime for background operation: {}", e))
    })?;
    let handle = runtime.spawn(op);
    Ok(async move {
        match handle.await {
            Ok(result) => result,
            Err(e) => Err(StorageError::Internal(format!(
                "background operation failed: {}",
                e
            ))),
        }
    }
    .boxed())
}
