//! Item listener registrations.
//!
//! A registration is an opaque value as far as configuration is concerned: it is stored,
//! kept in declaration order and shipped to the engine, which is responsible for dispatch.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Registration of an item listener on a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemListenerConfig {
    /// Fully qualified name of the listener implementation, if declared by name
    #[serde(default)]
    pub class_name: Option<String>,

    /// Whether events should carry the item value
    #[serde(default = "default_include_value")]
    pub include_value: bool,

    /// Whether the listener only observes items owned by the local member
    #[serde(default)]
    pub local: bool,
}

fn default_include_value() -> bool {
    true
}

impl Default for ItemListenerConfig {
    fn default() -> Self {
        Self {
            class_name: None,
            include_value: true,
            local: false,
        }
    }
}

impl ItemListenerConfig {
    pub fn new(class_name: impl Into<String>, include_value: bool) -> Self {
        Self {
            class_name: Some(class_name.into()),
            include_value,
            local: false,
        }
    }

    /// Mark the registration as member-local
    pub fn with_local(mut self, local: bool) -> Self {
        self.local = local;
        self
    }
}

impl fmt::Display for ItemListenerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ItemListenerConfig [className={}, includeValue={}, local={}]",
            self.class_name.as_deref().unwrap_or("null"),
            self.include_value,
            self.local
        )
    }
}
