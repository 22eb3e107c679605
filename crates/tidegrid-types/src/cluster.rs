//! Cluster-wide configuration holding named collection declarations.

use crate::error::ConfigError;
use crate::queue::QueueConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Maximum number of backups (sync plus async) a collection may declare.
pub const MAX_BACKUP_COUNT: i32 = 6;

/// Name of the queue declaration used as template for undeclared queues.
pub const DEFAULT_QUEUE_NAME: &str = "default";

/// Declarations for every named collection of a cluster.
///
/// # Example
/// ```
/// use tidegrid_types::ClusterConfig;
///
/// let mut config = ClusterConfig::from_json_str(r#"{
///     "clusterName": "dev",
///     "queues": { "default": { "maxSize": 100, "syncBackupCount": 2 } }
/// }"#)?;
///
/// // Undeclared queues are derived from the "default" template
/// let orders = config.queue_config("orders");
/// assert_eq!(orders.max_size(), 100);
/// assert_eq!(orders.sync_backup_count(), 2);
/// # Ok::<(), tidegrid_types::ConfigError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    #[serde(default)]
    pub cluster_name: String,

    #[serde(default)]
    queues: BTreeMap<String, QueueConfig>,
}

impl ClusterConfig {
    pub fn new(cluster_name: impl Into<String>) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            queues: BTreeMap::new(),
        }
    }

    /// Parse a JSON document. Entries without a `name` take their map key.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let mut config: ClusterConfig = serde_json::from_str(json)?;
        for (key, queue) in config.queues.iter_mut() {
            if queue.name().is_none() {
                queue.set_name(key.clone());
            }
        }
        debug!(
            cluster = %config.cluster_name,
            queues = config.queues.len(),
            "Loaded cluster config"
        );
        Ok(config)
    }

    /// Read and parse a JSON document from disk
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        info!("Loading cluster config from {}", path.display());
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Declare a queue, replacing any previous declaration under the same name.
    ///
    /// Unnamed configs are stored under the empty name.
    pub fn add_queue_config(&mut self, config: QueueConfig) -> &mut Self {
        let key = config.name().unwrap_or_default().to_string();
        self.queues.insert(key, config);
        self
    }

    pub fn with_queue_config(mut self, config: QueueConfig) -> Self {
        self.add_queue_config(config);
        self
    }

    pub fn find_queue_config(&self, name: &str) -> Option<&QueueConfig> {
        self.queues.get(name)
    }

    /// Declaration for `name`, derived from the template when missing.
    ///
    /// A derived declaration copies the template's scalar fields (not its listeners), takes
    /// `name`, and is stored so later lookups return the same declaration.
    pub fn queue_config(&mut self, name: &str) -> &QueueConfig {
        if !self.queues.contains_key(name) {
            let derived = self.derive_queue_config(name);
            debug!("Derived queue config for '{}' from template", name);
            self.queues.insert(name.to_string(), derived);
        }
        &self.queues[name]
    }

    /// Like [`ClusterConfig::queue_config`] but leaves the registry untouched.
    pub fn derive_queue_config(&self, name: &str) -> QueueConfig {
        if let Some(config) = self.queues.get(name) {
            return config.clone();
        }
        match self.queues.get(DEFAULT_QUEUE_NAME) {
            Some(template) => QueueConfig::copy_of(template).with_name(name),
            None => QueueConfig::new(name),
        }
    }

    pub fn queue_configs(&self) -> impl Iterator<Item = &QueueConfig> {
        self.queues.values()
    }

    /// Check every queue declared on both sides for compatibility.
    ///
    /// Declarations that agree on the name but differ in capacity or backups are accepted;
    /// the engine decides which values win.
    pub fn check_compatibility(&self, other: &ClusterConfig) -> Result<(), ConfigError> {
        for (key, ours) in &self.queues {
            let Some(theirs) = other.queues.get(key) else {
                continue;
            };

            if !ours.is_compatible(Some(theirs)) {
                return Err(ConfigError::Incompatible {
                    kind: "queue",
                    name: key.clone(),
                });
            }

            if ours.total_backup_count() != theirs.total_backup_count()
                || ours.raw_max_size() != theirs.raw_max_size()
            {
                debug!(
                    queue = %key,
                    ours_backups = ours.total_backup_count(),
                    theirs_backups = theirs.total_backup_count(),
                    ours_max_size = ours.raw_max_size(),
                    theirs_max_size = theirs.raw_max_size(),
                    "Compatible queue declarations differ in capacity or backups"
                );
            }
        }
        Ok(())
    }

    /// Check backup counts against [`MAX_BACKUP_COUNT`]
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, queue) in &self.queues {
            if queue.sync_backup_count() < 0 || queue.async_backup_count() < 0 {
                return Err(ConfigError::InvalidArgument(format!(
                    "queue '{}': backup counts must be >= 0 (sync={}, async={})",
                    key,
                    queue.sync_backup_count(),
                    queue.async_backup_count()
                )));
            }

            let total = queue
                .sync_backup_count()
                .checked_add(queue.async_backup_count())
                .filter(|total| *total <= MAX_BACKUP_COUNT);
            if total.is_none() {
                return Err(ConfigError::InvalidArgument(format!(
                    "queue '{}': total backup count (sync={}, async={}) exceeds maximum {}",
                    key,
                    queue.sync_backup_count(),
                    queue.async_backup_count(),
                    MAX_BACKUP_COUNT
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::ItemListenerConfig;
    use std::io::Write;

    const DOCUMENT: &str = r#"{
        "clusterName": "staging",
        "queues": {
            "default": {
                "maxSize": 1000,
                "syncBackupCount": 2,
                "itemListeners": [{"className": "com.acme.Template"}]
            },
            "orders": {
                "name": "orders",
                "asyncBackupCount": 1
            },
            "jobs": {}
        }
    }"#;

    #[test]
    fn test_load_document() {
        let config = ClusterConfig::from_json_str(DOCUMENT).unwrap();
        assert_eq!(config.cluster_name, "staging");

        let orders = config.find_queue_config("orders").unwrap();
        assert_eq!(orders.sync_backup_count(), 1);
        assert_eq!(orders.async_backup_count(), 1);
        assert_eq!(orders.max_size(), i32::MAX);

        // Name taken from the key
        let jobs = config.find_queue_config("jobs").unwrap();
        assert_eq!(jobs.name(), Some("jobs"));
    }

    #[test]
    fn test_load_rejects_negative_max_size() {
        let err = ClusterConfig::from_json_str(r#"{"queues": {"q": {"maxSize": -1}}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DOCUMENT.as_bytes()).unwrap();

        let config = ClusterConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.queue_configs().count(), 3);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClusterConfig::from_json_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_json_round_trip() {
        let config = ClusterConfig::from_json_str(DOCUMENT).unwrap();
        let json = config.to_json_string().unwrap();
        assert_eq!(ClusterConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_queue_config_derived_from_template() {
        let mut config = ClusterConfig::from_json_str(DOCUMENT).unwrap();

        let payments = config.queue_config("payments").clone();
        assert_eq!(payments.name(), Some("payments"));
        assert_eq!(payments.max_size(), 1000);
        assert_eq!(payments.sync_backup_count(), 2);
        // Template listeners are not carried over
        assert!(payments.item_listener_configs().is_empty());

        // Stored for later lookups
        assert!(config.find_queue_config("payments").is_some());
        // Existing declarations are returned untouched
        assert_eq!(config.queue_config("orders").async_backup_count(), 1);
    }

    #[test]
    fn test_derive_does_not_register() {
        let config = ClusterConfig::new("dev")
            .with_queue_config(QueueConfig::new(DEFAULT_QUEUE_NAME).with_max_size(10).unwrap());
        let derived = config.derive_queue_config("jobs");
        assert_eq!(derived.name(), Some("jobs"));
        assert_eq!(derived.max_size(), 10);
        assert!(config.find_queue_config("jobs").is_none());
    }

    #[test]
    fn test_queue_config_without_template() {
        let mut config = ClusterConfig::new("bare");
        let queue = config.queue_config("q");
        assert_eq!(queue.name(), Some("q"));
        assert_eq!(queue.sync_backup_count(), 1);
    }

    #[test]
    fn test_compatibility() {
        let a = ClusterConfig::new("a")
            .with_queue_config(QueueConfig::new("orders").with_sync_backup_count(1));
        let b = ClusterConfig::new("b").with_queue_config(
            QueueConfig::new("orders")
                .with_sync_backup_count(3)
                .with_item_listener(ItemListenerConfig::default()),
        );
        assert!(a.check_compatibility(&b).is_ok());

        // Declaration stored under a key that differs from its name
        let mut c = ClusterConfig::new("c");
        c.queues
            .insert("orders".to_string(), QueueConfig::new("orders-v2"));
        let err = a.check_compatibility(&c).unwrap_err();
        assert!(matches!(err, ConfigError::Incompatible { kind: "queue", .. }));
    }

    #[test]
    fn test_validate_backup_counts() {
        let ok = ClusterConfig::new("c").with_queue_config(
            QueueConfig::new("q")
                .with_sync_backup_count(4)
                .with_async_backup_count(2),
        );
        assert!(ok.validate().is_ok());

        let too_many = ClusterConfig::new("c").with_queue_config(
            QueueConfig::new("q")
                .with_sync_backup_count(4)
                .with_async_backup_count(3),
        );
        assert!(matches!(
            too_many.validate(),
            Err(ConfigError::InvalidArgument(_))
        ));

        let negative = ClusterConfig::new("c")
            .with_queue_config(QueueConfig::new("q").with_async_backup_count(-1));
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_overflowing_backup_counts() {
        let config = ClusterConfig::new("c").with_queue_config(
            QueueConfig::new("q")
                .with_sync_backup_count(i32::MAX)
                .with_async_backup_count(i32::MAX),
        );
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidArgument(_))
        ));
    }
}
