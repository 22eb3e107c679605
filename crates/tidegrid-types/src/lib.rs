//! # tidegrid-types
//!
//! Configuration model and shared types for tidegrid.
//!
//! This crate provides:
//! - Queue configuration (capacity bound, sync/async backup counts, listener registrations)
//! - Cluster configuration holding named declarations, loaded from JSON
//! - The fixed-layout binary codec used to ship configuration between members
//! - Error types shared by the backends and adapters
//!
//! It does not depend on an async runtime, so configuration-loading code can use it on its own.

pub mod cluster;
pub mod codec;
pub mod error;
pub mod listener;
pub mod queue;

pub use cluster::{ClusterConfig, DEFAULT_QUEUE_NAME, MAX_BACKUP_COUNT};
pub use codec::{DataInput, DataOutput, DataSerializable};
pub use error::{ConfigError, StorageError};
pub use listener::ItemListenerConfig;
pub use queue::{
    QueueConfig, DEFAULT_ASYNC_BACKUP_COUNT, DEFAULT_MAX_SIZE, DEFAULT_SYNC_BACKUP_COUNT,
};
