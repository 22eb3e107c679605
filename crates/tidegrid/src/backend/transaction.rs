//! Transactions over a [`DistributedMap`].
//!
//! A transaction buffers its writes until commit, then applies them to the map under the
//! map's commit lock. Reads inside the transaction see its own uncommitted writes.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut tx = Transaction::begin(map.clone(), TransactionOptions::default());
//! tx.put(1, "one".to_string()).await?;
//! assert_eq!(tx.get(&1).await?, Some("one".to_string()));
//! tx.commit().await?;
//! ```

use super::{DistributedMap, MapKey, MapValue};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tidegrid_types::StorageError;
use tracing::debug;

static NEXT_TX_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Active,
    Committed,
    Aborted,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("Transaction is not active")]
    NotActive,

    #[error("Transaction timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Write buffer limit exceeded")]
    WriteBufferFull,

    #[error("Transaction already committed or aborted")]
    AlreadyFinished,

    #[error("Conflict detected on {conflicting_keys} keys")]
    ConflictDetected { conflicting_keys: usize },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Isolation level for transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    /// Reads see whatever is committed at read time
    #[default]
    ReadCommitted,
    /// Commit fails if a value read by the transaction changed since it was read
    Serializable,
}

#[derive(Debug, Clone)]
pub struct TransactionOptions {
    /// Maximum number of distinct keys written before `WriteBufferFull`
    pub max_write_buffer: usize,
    pub timeout: Duration,
    pub isolation_level: IsolationLevel,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            max_write_buffer: 100_000,
            timeout: Duration::from_secs(120),
            isolation_level: IsolationLevel::ReadCommitted,
        }
    }
}

/// A transaction bound to one map.
///
/// Dropping an active transaction discards its writes.
pub struct Transaction<K, V> {
    id: u64,
    map: Arc<DistributedMap<K, V>>,
    /// Buffered writes, `None` marks a delete
    write_set: HashMap<K, Option<V>>,
    /// Values observed by reads, only tracked for `Serializable`
    read_set: HashMap<K, Option<V>>,
    /// Values conditional writes were decided on, checked again at commit
    guarded: HashMap<K, Option<V>>,
    status: TransactionStatus,
    started_at: Instant,
    options: TransactionOptions,
}

impl<K: MapKey, V: MapValue> Transaction<K, V> {
    pub fn begin(map: Arc<DistributedMap<K, V>>, options: TransactionOptions) -> Self {
        Self {
            id: NEXT_TX_ID.fetch_add(1, Ordering::Relaxed),
            map,
            write_set: HashMap::new(),
            read_set: HashMap::new(),
            guarded: HashMap::new(),
            status: TransactionStatus::Active,
            started_at: Instant::now(),
            options,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == TransactionStatus::Active
    }

    pub fn pending_writes(&self) -> usize {
        self.write_set.len()
    }

    fn check_active(&self) -> Result<(), TransactionError> {
        if self.status != TransactionStatus::Active {
            return Err(TransactionError::NotActive);
        }
        if self.started_at.elapsed() > self.options.timeout {
            return Err(TransactionError::TimedOut(self.options.timeout));
        }
        Ok(())
    }

    fn buffer(&mut self, key: K, value: Option<V>) -> Result<(), TransactionError> {
        if !self.write_set.contains_key(&key)
            && self.write_set.len() >= self.options.max_write_buffer
        {
            return Err(TransactionError::WriteBufferFull);
        }
        self.write_set.insert(key, value);
        Ok(())
    }

    /// Value of `key` as seen by this transaction
    async fn current(&mut self, key: &K) -> Result<Option<V>, TransactionError> {
        if let Some(value) = self.write_set.get(key) {
            return Ok(value.clone());
        }

        let value = self.map.get(key).await?;
        if self.options.isolation_level == IsolationLevel::Serializable {
            self.read_set
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        Ok(value)
    }

    /// Like [`Self::current`], but a committed value also becomes a precondition of commit
    async fn current_guarded(&mut self, key: &K) -> Result<Option<V>, TransactionError> {
        if let Some(value) = self.write_set.get(key) {
            return Ok(value.clone());
        }
        let value = self.current(key).await?;
        self.guarded
            .entry(key.clone())
            .or_insert_with(|| value.clone());
        Ok(value)
    }

    pub async fn get(&mut self, key: &K) -> Result<Option<V>, TransactionError> {
        self.check_active()?;
        self.current(key).await
    }

    pub async fn contains_key(&mut self, key: &K) -> Result<bool, TransactionError> {
        self.check_active()?;
        Ok(self.current(key).await?.is_some())
    }

    /// Buffer a write, returning the value visible before it
    pub async fn put(&mut self, key: K, value: V) -> Result<Option<V>, TransactionError> {
        self.check_active()?;
        let previous = self.current(&key).await?;
        self.buffer(key, Some(value))?;
        Ok(previous)
    }

    pub async fn set(&mut self, key: K, value: V) -> Result<(), TransactionError> {
        self.check_active()?;
        self.buffer(key, Some(value))
    }

    /// Buffer a write if `key` is absent; returns the existing value otherwise
    pub async fn put_if_absent(&mut self, key: K, value: V) -> Result<Option<V>, TransactionError> {
        self.check_active()?;
        match self.current_guarded(&key).await? {
            Some(existing) => Ok(Some(existing)),
            None => {
                self.buffer(key, Some(value))?;
                Ok(None)
            }
        }
    }

    pub async fn replace(&mut self, key: K, value: V) -> Result<Option<V>, TransactionError> {
        self.check_active()?;
        let previous = self.current_guarded(&key).await?;
        if previous.is_some() {
            self.buffer(key, Some(value))?;
        }
        Ok(previous)
    }

    pub async fn replace_if_same(
        &mut self,
        key: K,
        expected: &V,
        value: V,
    ) -> Result<bool, TransactionError> {
        self.check_active()?;
        match self.current_guarded(&key).await? {
            Some(current) if current == *expected => {
                self.buffer(key, Some(value))?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub async fn remove(&mut self, key: &K) -> Result<Option<V>, TransactionError> {
        self.check_active()?;
        let previous = self.current_guarded(key).await?;
        if previous.is_some() {
            self.buffer(key.clone(), None)?;
        }
        Ok(previous)
    }

    pub async fn remove_if_same(&mut self, key: &K, expected: &V) -> Result<bool, TransactionError> {
        self.check_active()?;
        match self.current_guarded(key).await? {
            Some(current) if current == *expected => {
                self.buffer(key.clone(), None)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub async fn delete(&mut self, key: &K) -> Result<(), TransactionError> {
        self.check_active()?;
        self.buffer(key.clone(), None)
    }

    /// Committed keys merged with this transaction's buffered writes
    pub fn key_set(&self) -> Result<HashSet<K>, TransactionError> {
        self.check_active()?;
        let mut keys = self.map.key_set();
        for (key, value) in &self.write_set {
            match value {
                Some(_) => keys.insert(key.clone()),
                None => keys.remove(key),
            };
        }
        Ok(keys)
    }

    /// Apply buffered writes to the map.
    ///
    /// The commit fails, and nothing is applied, if a value a conditional write was decided on
    /// has changed since. With `Serializable` isolation the same holds for every value read.
    /// Returns the number of keys written.
    pub async fn commit(mut self) -> Result<usize, TransactionError> {
        if self.status != TransactionStatus::Active {
            return Err(TransactionError::AlreadyFinished);
        }
        self.check_active()?;

        let _guard = self.map.lock_commits().await;

        let mut conflicting: HashSet<&K> = self
            .guarded
            .iter()
            .filter(|(key, seen)| self.map.peek(key) != **seen)
            .map(|(key, _)| key)
            .collect();
        if self.options.isolation_level == IsolationLevel::Serializable {
            conflicting.extend(
                self.read_set
                    .iter()
                    .filter(|(key, seen)| self.map.peek(key) != **seen)
                    .map(|(key, _)| key),
            );
        }

        let conflicts = conflicting.len();
        if conflicts > 0 {
            self.status = TransactionStatus::Aborted;
            debug!(
                tx = self.id,
                map = self.map.name(),
                conflicts,
                "Transaction aborted on conflict"
            );
            return Err(TransactionError::ConflictDetected {
                conflicting_keys: conflicts,
            });
        }

        let writes: Vec<(K, Option<V>)> = self.write_set.drain().collect();
        let write_count = writes.len();
        self.map.apply_writes(writes);
        self.status = TransactionStatus::Committed;

        debug!(
            tx = self.id,
            map = self.map.name(),
            writes = write_count,
            "Transaction committed"
        );
        Ok(write_count)
    }

    /// Discard buffered writes
    pub fn rollback(mut self) {
        self.write_set.clear();
        self.status = TransactionStatus::Aborted;
        debug!(tx = self.id, map = self.map.name(), "Transaction rolled back");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_map() -> Arc<DistributedMap<i32, String>> {
        Arc::new(DistributedMap::new("tx-test"))
    }

    #[tokio::test]
    async fn test_read_your_writes() {
        let map = create_map();
        let mut tx = Transaction::begin(map.clone(), TransactionOptions::default());

        tx.set(1, "one".into()).await.unwrap();
        assert_eq!(tx.get(&1).await.unwrap(), Some("one".into()));
        // Not visible outside before commit
        assert_eq!(map.get(&1).await.unwrap(), None);

        assert_eq!(tx.commit().await.unwrap(), 1);
        assert_eq!(map.get(&1).await.unwrap(), Some("one".into()));
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let map = create_map();
        let mut tx = Transaction::begin(map.clone(), TransactionOptions::default());
        tx.put(1, "one".into()).await.unwrap();
        tx.rollback();
        assert!(map.is_empty());
    }

    #[tokio::test]
    async fn test_conditional_operations() {
        let map = create_map();
        map.put(42, "old".into()).await.unwrap();

        let mut tx = Transaction::begin(map.clone(), TransactionOptions::default());
        assert_eq!(
            tx.put_if_absent(42, "new".into()).await.unwrap(),
            Some("old".into())
        );
        assert_eq!(tx.put_if_absent(23, "new".into()).await.unwrap(), None);
        assert!(!tx
            .replace_if_same(42, &"other".to_string(), "x".into())
            .await
            .unwrap());
        assert!(tx
            .replace_if_same(42, &"old".to_string(), "x".into())
            .await
            .unwrap());
        assert!(tx.remove_if_same(&23, &"new".to_string()).await.unwrap());
        assert!(!tx.contains_key(&23).await.unwrap());
        tx.commit().await.unwrap();

        assert_eq!(map.get(&42).await.unwrap(), Some("x".into()));
        assert!(!map.contains_key(&23).await.unwrap());
    }

    #[tokio::test]
    async fn test_key_set_merges_buffered_writes() {
        let map = create_map();
        map.put(1, "a".into()).await.unwrap();
        map.put(2, "b".into()).await.unwrap();

        let mut tx = Transaction::begin(map, TransactionOptions::default());
        tx.delete(&1).await.unwrap();
        tx.set(3, "c".into()).await.unwrap();
        assert_eq!(tx.key_set().unwrap(), HashSet::from([2, 3]));
    }

    #[tokio::test]
    async fn test_write_buffer_limit() {
        let options = TransactionOptions {
            max_write_buffer: 2,
            ..Default::default()
        };
        let mut tx = Transaction::begin(create_map(), options);
        tx.set(1, "a".into()).await.unwrap();
        tx.set(2, "b".into()).await.unwrap();
        // Rewriting a buffered key does not count
        tx.set(2, "c".into()).await.unwrap();
        assert_eq!(
            tx.set(3, "d".into()).await,
            Err(TransactionError::WriteBufferFull)
        );
    }

    #[tokio::test]
    async fn test_timeout() {
        let options = TransactionOptions {
            timeout: Duration::ZERO,
            ..Default::default()
        };
        let mut tx = Transaction::begin(create_map(), options);
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(matches!(
            tx.get(&1).await,
            Err(TransactionError::TimedOut(_))
        ));
    }

    #[tokio::test]
    async fn test_serializable_conflict_detection() {
        let map = create_map();
        map.put(1, "original".into()).await.unwrap();

        let options = TransactionOptions {
            isolation_level: IsolationLevel::Serializable,
            ..Default::default()
        };
        let mut tx = Transaction::begin(map.clone(), options);
        assert_eq!(tx.get(&1).await.unwrap(), Some("original".into()));
        tx.set(2, "derived".into()).await.unwrap();

        // Concurrent writer changes the value read by the transaction
        map.put(1, "changed".into()).await.unwrap();

        assert_eq!(
            tx.commit().await,
            Err(TransactionError::ConflictDetected {
                conflicting_keys: 1
            })
        );
        assert!(!map.contains_key(&2).await.unwrap());
    }

    #[tokio::test]
    async fn test_conditional_write_fails_on_concurrent_change() {
        let map = create_map();

        let mut tx = Transaction::begin(map.clone(), TransactionOptions::default());
        assert_eq!(tx.put_if_absent(1, "tx".into()).await.unwrap(), None);

        // Plain writer claims the key before the transaction commits
        map.put(1, "plain".into()).await.unwrap();

        assert_eq!(
            tx.commit().await,
            Err(TransactionError::ConflictDetected {
                conflicting_keys: 1
            })
        );
        assert_eq!(map.get(&1).await.unwrap(), Some("plain".into()));
    }

    #[tokio::test]
    async fn test_compare_and_swap_fails_on_concurrent_change() {
        let map = create_map();
        map.put(1, "a".into()).await.unwrap();
        map.put(2, "b".into()).await.unwrap();

        let mut tx = Transaction::begin(map.clone(), TransactionOptions::default());
        assert!(tx
            .replace_if_same(1, &"a".to_string(), "tx".into())
            .await
            .unwrap());
        assert!(tx.remove_if_same(&2, &"b".to_string()).await.unwrap());

        map.put(1, "plain".into()).await.unwrap();
        map.remove(&2).await.unwrap();
        map.put(2, "again".into()).await.unwrap();

        assert_eq!(
            tx.commit().await,
            Err(TransactionError::ConflictDetected {
                conflicting_keys: 2
            })
        );
        assert_eq!(map.get(&1).await.unwrap(), Some("plain".into()));
        assert_eq!(map.get(&2).await.unwrap(), Some("again".into()));
    }

    #[tokio::test]
    async fn test_unchanged_precondition_commits() {
        let map = create_map();
        map.put(1, "a".into()).await.unwrap();

        let mut tx = Transaction::begin(map.clone(), TransactionOptions::default());
        assert!(tx
            .replace_if_same(1, &"a".to_string(), "b".into())
            .await
            .unwrap());
        // Unrelated key written concurrently
        map.put(2, "other".into()).await.unwrap();

        assert_eq!(tx.commit().await.unwrap(), 1);
        assert_eq!(map.get(&1).await.unwrap(), Some("b".into()));
    }

    #[tokio::test]
    async fn test_read_committed_ignores_concurrent_change() {
        let map = create_map();
        map.put(1, "original".into()).await.unwrap();

        let mut tx = Transaction::begin(map.clone(), TransactionOptions::default());
        tx.get(&1).await.unwrap();
        map.put(1, "changed".into()).await.unwrap();
        tx.set(2, "derived".into()).await.unwrap();

        assert_eq!(tx.commit().await.unwrap(), 1);
        assert_eq!(map.get(&2).await.unwrap(), Some("derived".into()));
    }
}
