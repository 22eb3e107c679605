//! Queue configuration: capacity bound, backup counts and item listener registrations.

use crate::codec::{DataInput, DataOutput, DataSerializable};
use crate::error::ConfigError;
use crate::listener::ItemListenerConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw max size meaning "unbounded"
pub const DEFAULT_MAX_SIZE: i32 = 0;

/// Backups written before a mutation is acknowledged
pub const DEFAULT_SYNC_BACKUP_COUNT: i32 = 1;

/// Backups written without waiting for them
pub const DEFAULT_ASYNC_BACKUP_COUNT: i32 = 0;

/// Configuration of one named distributed queue.
///
/// The engine consuming this config owns the replica placement; this type only records the
/// declared values. `max_size` is stored raw, with `0` standing for "unbounded", and only
/// translated when read through [`QueueConfig::max_size`].
///
/// # Example
/// ```
/// use tidegrid_types::{ItemListenerConfig, QueueConfig};
///
/// let mut config = QueueConfig::new("orders");
/// config
///     .set_max_size(10_000)?
///     .set_sync_backup_count(2)
///     .set_async_backup_count(1)
///     .add_item_listener_config(ItemListenerConfig::new("com.acme.OrderListener", true));
///
/// assert_eq!(config.total_backup_count(), 3);
/// # Ok::<(), tidegrid_types::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "QueueConfigDef")]
pub struct QueueConfig {
    name: Option<String>,
    sync_backup_count: i32,
    async_backup_count: i32,
    max_size: i32,
    #[serde(rename = "itemListeners")]
    item_listener_configs: Vec<ItemListenerConfig>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: None,
            sync_backup_count: DEFAULT_SYNC_BACKUP_COUNT,
            async_backup_count: DEFAULT_ASYNC_BACKUP_COUNT,
            max_size: DEFAULT_MAX_SIZE,
            item_listener_configs: Vec::new(),
        }
    }
}

impl QueueConfig {
    /// Create a config with default capacity and backup counts
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Copy the name, backup counts and max size of `other`.
    ///
    /// Listener registrations are not copied: the copy starts with an empty listener list.
    /// Use `clone()` for a full copy.
    pub fn copy_of(other: &QueueConfig) -> Self {
        Self {
            name: other.name.clone(),
            sync_backup_count: other.sync_backup_count,
            async_backup_count: other.async_backup_count,
            max_size: other.max_size,
            item_listener_configs: Vec::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Capacity bound, `i32::MAX` when unbounded
    pub fn max_size(&self) -> i32 {
        if self.max_size == 0 {
            i32::MAX
        } else {
            self.max_size
        }
    }

    /// Capacity bound as stored, `0` when unbounded
    pub fn raw_max_size(&self) -> i32 {
        self.max_size
    }

    /// Set the capacity bound; `0` means unbounded.
    ///
    /// Fails with [`ConfigError::InvalidArgument`] for negative values and leaves the config
    /// unchanged.
    pub fn set_max_size(&mut self, max_size: i32) -> Result<&mut Self, ConfigError> {
        if max_size < 0 {
            return Err(ConfigError::InvalidArgument(format!(
                "size of the queue can not be a negative value: {}",
                max_size
            )));
        }
        self.max_size = max_size;
        Ok(self)
    }

    pub fn sync_backup_count(&self) -> i32 {
        self.sync_backup_count
    }

    // Range checks on backup counts belong to the consuming engine.
    pub fn set_sync_backup_count(&mut self, count: i32) -> &mut Self {
        self.sync_backup_count = count;
        self
    }

    pub fn async_backup_count(&self) -> i32 {
        self.async_backup_count
    }

    pub fn set_async_backup_count(&mut self, count: i32) -> &mut Self {
        self.async_backup_count = count;
        self
    }

    /// Sync plus async backups.
    ///
    /// The counts are stored unchecked, so the sum wraps on overflow.
    pub fn total_backup_count(&self) -> i32 {
        self.sync_backup_count.wrapping_add(self.async_backup_count)
    }

    /// Append a listener registration; registrations keep their insertion order
    pub fn add_item_listener_config(&mut self, listener: ItemListenerConfig) -> &mut Self {
        self.item_listener_configs.push(listener);
        self
    }

    pub fn item_listener_configs(&self) -> &[ItemListenerConfig] {
        &self.item_listener_configs
    }

    /// Replace every listener registration
    pub fn set_item_listener_configs(&mut self, listeners: Vec<ItemListenerConfig>) -> &mut Self {
        self.item_listener_configs = listeners;
        self
    }

    /// Two configs are compatible when their names are equal, both absent included.
    ///
    /// Capacity and backup counts do not take part; reconciling them is up to the engine.
    pub fn is_compatible(&self, other: Option<&QueueConfig>) -> bool {
        match other {
            Some(other) => self.name == other.name,
            None => false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.set_name(name);
        self
    }

    pub fn with_max_size(mut self, max_size: i32) -> Result<Self, ConfigError> {
        self.set_max_size(max_size)?;
        Ok(self)
    }

    pub fn with_sync_backup_count(mut self, count: i32) -> Self {
        self.sync_backup_count = count;
        self
    }

    pub fn with_async_backup_count(mut self, count: i32) -> Self {
        self.async_backup_count = count;
        self
    }

    pub fn with_item_listener(mut self, listener: ItemListenerConfig) -> Self {
        self.item_listener_configs.push(listener);
        self
    }
}

// Wire layout: name, sync backups, async backups, raw max size.
impl DataSerializable for QueueConfig {
    fn write_data(&self, out: &mut DataOutput) -> Result<(), ConfigError> {
        let name = self
            .name
            .as_deref()
            .ok_or_else(|| ConfigError::Serialization("queue config has no name".to_string()))?;
        out.write_utf(name)?;
        out.write_i32(self.sync_backup_count);
        out.write_i32(self.async_backup_count);
        out.write_i32(self.max_size);
        Ok(())
    }

    fn read_data(&mut self, input: &mut DataInput) -> Result<(), ConfigError> {
        let name = input.read_utf()?;
        let sync_backup_count = input.read_i32()?;
        let async_backup_count = input.read_i32()?;
        let max_size = input.read_i32()?;

        self.name = Some(name);
        self.sync_backup_count = sync_backup_count;
        self.async_backup_count = async_backup_count;
        self.max_size = max_size;
        Ok(())
    }
}

impl fmt::Display for QueueConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "QueueConfig [name={}]",
            self.name.as_deref().unwrap_or("null")
        )
    }
}

/// Document form of [`QueueConfig`]; routes `maxSize` through the validating setter.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueueConfigDef {
    #[serde(default)]
    name: Option<String>,
    #[serde(default = "default_sync_backup_count")]
    sync_backup_count: i32,
    #[serde(default)]
    async_backup_count: i32,
    #[serde(default)]
    max_size: i32,
    #[serde(default)]
    item_listeners: Vec<ItemListenerConfig>,
}

fn default_sync_backup_count() -> i32 {
    DEFAULT_SYNC_BACKUP_COUNT
}

impl TryFrom<QueueConfigDef> for QueueConfig {
    type Error = ConfigError;

    fn try_from(def: QueueConfigDef) -> Result<Self, Self::Error> {
        let mut config = QueueConfig {
            name: def.name,
            ..QueueConfig::default()
        };
        config
            .set_max_size(def.max_size)?
            .set_sync_backup_count(def.sync_backup_count)
            .set_async_backup_count(def.async_backup_count)
            .set_item_listener_configs(def.item_listeners);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = QueueConfig::default();
        assert_eq!(config.name(), None);
        assert_eq!(config.sync_backup_count(), 1);
        assert_eq!(config.async_backup_count(), 0);
        assert_eq!(config.total_backup_count(), 1);
        assert_eq!(config.raw_max_size(), 0);
        assert_eq!(config.max_size(), i32::MAX);
        assert!(config.item_listener_configs().is_empty());
    }

    #[test]
    fn test_max_size_sentinel_translated_on_read_only() {
        let mut config = QueueConfig::new("q");
        config.set_max_size(0).unwrap();
        assert_eq!(config.max_size(), i32::MAX);
        assert_eq!(config.raw_max_size(), 0);

        config.set_max_size(250).unwrap();
        assert_eq!(config.max_size(), 250);
        assert_eq!(config.raw_max_size(), 250);
    }

    #[test]
    fn test_negative_max_size_rejected() {
        let mut config = QueueConfig::new("q");
        config.set_max_size(10).unwrap();

        let err = config.set_max_size(-1).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidArgument(_)));
        // Rejected value leaves the previous one in place
        assert_eq!(config.max_size(), 10);
    }

    #[test]
    fn test_backup_counts_not_validated() {
        let mut config = QueueConfig::new("q");
        config.set_sync_backup_count(-2).set_async_backup_count(9);
        assert_eq!(config.sync_backup_count(), -2);
        assert_eq!(config.async_backup_count(), 9);
        assert_eq!(config.total_backup_count(), 7);

        config.set_sync_backup_count(i32::MAX).set_async_backup_count(1);
        assert_eq!(config.total_backup_count(), i32::MIN);
    }

    #[test]
    fn test_listeners_keep_insertion_order() {
        let mut config = QueueConfig::new("q");
        config
            .add_item_listener_config(ItemListenerConfig::new("first", true))
            .add_item_listener_config(ItemListenerConfig::new("second", false))
            .add_item_listener_config(ItemListenerConfig::new("third", true));

        let names: Vec<_> = config
            .item_listener_configs()
            .iter()
            .map(|l| l.class_name.as_deref().unwrap())
            .collect();
        assert_eq!(names, vec!["first", "second", "third"]);

        config.set_item_listener_configs(vec![ItemListenerConfig::new("only", true)]);
        assert_eq!(config.item_listener_configs().len(), 1);
    }

    #[test]
    fn test_copy_of_drops_listeners() {
        let original = QueueConfig::new("orders")
            .with_max_size(100)
            .unwrap()
            .with_sync_backup_count(2)
            .with_async_backup_count(1)
            .with_item_listener(ItemListenerConfig::new("listener", true));

        let copy = QueueConfig::copy_of(&original);
        assert_eq!(copy.name(), Some("orders"));
        assert_eq!(copy.raw_max_size(), 100);
        assert_eq!(copy.sync_backup_count(), 2);
        assert_eq!(copy.async_backup_count(), 1);
        assert!(copy.item_listener_configs().is_empty());

        // A plain clone keeps them
        assert_eq!(original.clone().item_listener_configs().len(), 1);
    }

    #[test]
    fn test_compatibility_is_name_equality() {
        let a = QueueConfig::new("orders").with_sync_backup_count(3);
        let b = QueueConfig::new("orders")
            .with_max_size(5)
            .unwrap()
            .with_async_backup_count(2);
        let c = QueueConfig::new("payments");

        assert!(a.is_compatible(Some(&b)));
        assert!(b.is_compatible(Some(&a)));
        assert!(!a.is_compatible(Some(&c)));
        assert!(!a.is_compatible(None));

        let unnamed = QueueConfig::default();
        assert!(unnamed.is_compatible(Some(&QueueConfig::default())));
        assert!(!unnamed.is_compatible(Some(&a)));
        assert!(!a.is_compatible(Some(&unnamed)));
    }

    #[test]
    fn test_wire_layout() {
        let config = QueueConfig::new("q1")
            .with_sync_backup_count(2)
            .with_async_backup_count(1);

        let bytes = config.to_bytes().unwrap();
        assert_eq!(
            bytes.to_vec(),
            vec![
                0, 2, b'q', b'1', // name
                0, 0, 0, 2, // sync backups
                0, 0, 0, 1, // async backups
                0, 0, 0, 0, // raw max size
            ]
        );
    }

    #[test]
    fn test_decode_keeps_raw_sentinel_and_listeners() {
        let source = QueueConfig::new("jobs")
            .with_sync_backup_count(0)
            .with_async_backup_count(3);
        let bytes = source.to_bytes().unwrap();

        let mut target =
            QueueConfig::default().with_item_listener(ItemListenerConfig::new("kept", true));
        target.read_data(&mut DataInput::new(&bytes)).unwrap();

        assert_eq!(target.name(), Some("jobs"));
        assert_eq!(target.sync_backup_count(), 0);
        assert_eq!(target.async_backup_count(), 3);
        assert_eq!(target.raw_max_size(), 0);
        assert_eq!(target.item_listener_configs().len(), 1);
    }

    #[test]
    fn test_encode_without_name_fails() {
        let err = QueueConfig::default().to_bytes().unwrap_err();
        assert!(matches!(err, ConfigError::Serialization(_)));
    }

    #[test]
    fn test_decode_truncated_fails() {
        let bytes = QueueConfig::new("q").to_bytes().unwrap();
        let err = QueueConfig::from_bytes(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, ConfigError::Deserialization(_)));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            QueueConfig::new("orders").to_string(),
            "QueueConfig [name=orders]"
        );
        assert_eq!(QueueConfig::default().to_string(), "QueueConfig [name=null]");
    }

    #[test]
    fn test_json_document() {
        let config: QueueConfig = serde_json::from_str(
            r#"{
                "name": "orders",
                "maxSize": 500,
                "asyncBackupCount": 2,
                "itemListeners": [{"className": "com.acme.Audit", "includeValue": false}]
            }"#,
        )
        .unwrap();

        assert_eq!(config.name(), Some("orders"));
        assert_eq!(config.max_size(), 500);
        assert_eq!(config.sync_backup_count(), DEFAULT_SYNC_BACKUP_COUNT);
        assert_eq!(config.async_backup_count(), 2);
        assert!(!config.item_listener_configs()[0].include_value);
    }

    #[test]
    fn test_json_negative_max_size_rejected() {
        let result: Result<QueueConfig, _> =
            serde_json::from_str(r#"{"name": "orders", "maxSize": -3}"#);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("negative"));
    }
}
