use thiserror::Error;

/// Configuration errors raised while building, loading or encoding collection configs.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Incompatible {kind} config: {name}")]
    Incompatible { kind: &'static str, name: String },

    #[error("Failed to serialize config: {0}")]
    Serialization(String),

    #[error("Failed to deserialize config: {0}")]
    Deserialization(String),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failures raised by a storage backend itself.
///
/// Adapters never rewrite these; whatever a backend returns reaches the caller as-is.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum StorageError {
    #[error("Failed to access underlying store: {0}")]
    BackendError(String),

    #[error("Structure '{name}' is registered with different key/value types")]
    TypeMismatch { name: String },

    #[error("Operation timeout: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
