//! # tidegrid
//!
//! In-process grid data structures and a uniform adapter layer over them.
//!
//! - [`backend`]: named maps, map transactions, a JCache-style cache and a near-cached map
//! - [`adapter`]: [`DataStructureAdapter`] and one adapter per backend, plus [`AnyAdapter`]
//! - [`GridInstance`]: hands out named backends under a validated [`ClusterConfig`]
//!
//! Configuration types live in `tidegrid-types` and are re-exported here.

pub mod adapter;
pub mod backend;
mod error;
pub mod instance;
pub mod stats;

pub use adapter::{
    AdapterFuture, AdapterKind, AdapterMethod, AdapterResult, AnyAdapter, DataStructureAdapter,
};
pub use error::AdapterError;
pub use instance::GridInstance;
pub use tidegrid_types::{ClusterConfig, ConfigError, QueueConfig, StorageError};

pub mod prelude {
    pub use crate::adapter::{
        AdapterFuture, AdapterKind, AdapterMethod, AdapterResult, AnyAdapter, CacheAdapter,
        DataStructureAdapter, MapAdapter, NearCacheAdapter, TransactionalMapAdapter,
    };
    pub use crate::backend::{
        DistributedCache, DistributedMap, IsolationLevel, NearCachedMap, Transaction,
        TransactionError, TransactionOptions,
    };
    pub use crate::error::AdapterError;
    pub use crate::instance::{GridInstance, DEFAULT_NEAR_CACHE_CAPACITY};
    pub use crate::stats::{LocalMapStats, NearCacheStats};
    pub use tidegrid_types::{
        ClusterConfig, ConfigError, ItemListenerConfig, QueueConfig, StorageError,
    };
}
