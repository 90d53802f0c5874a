//! Store source selection
//!
//! The ledger can keep its records in an embedded single-file database or
//! delegate them to a remote REST backend. This module holds the
//! configuration that picks one of the two; the wiring that turns it into a
//! concrete port lives with the binary that owns both adapters.
//!
//! # Usage
//!
//! ```rust,ignore
//! use core_kernel::registry::{StoreSource, RemoteConfig};
//!
//! let source = StoreSource::embedded("realty.db");
//! let remote = StoreSource::Remote(RemoteConfig::new("http://10.0.0.5:8001/api"));
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ports::AdapterType;

/// Where the ledger records live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreSource {
    /// Embedded single-file database
    Embedded(EmbeddedConfig),

    /// Remote REST backend
    Remote(RemoteConfig),
}

impl Default for StoreSource {
    fn default() -> Self {
        StoreSource::Embedded(EmbeddedConfig::default())
    }
}

impl StoreSource {
    /// Embedded store at the given file path with default settings
    pub fn embedded(path: impl Into<PathBuf>) -> Self {
        StoreSource::Embedded(EmbeddedConfig {
            path: path.into(),
            ..Default::default()
        })
    }

    /// Returns the adapter kind this source resolves to
    pub fn adapter_type(&self) -> AdapterType {
        match self {
            StoreSource::Embedded(_) => AdapterType::Embedded,
            StoreSource::Remote(_) => AdapterType::ExternalRestApi,
        }
    }
}

/// Settings for the embedded database file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedConfig {
    /// Database file path
    pub path: PathBuf,

    /// Pool size. The store assumes a single writer, so this stays at 1
    /// unless reads are moved off the write connection.
    pub max_connections: u32,
}

impl Default for EmbeddedConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("realty.db"),
            max_connections: 1,
        }
    }
}

/// Settings for the remote REST backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL including the API prefix, e.g. `http://host:8001/api`
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Additional headers to include in requests
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: 30,
            headers: HashMap::new(),
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_source_is_embedded() {
        let source = StoreSource::default();
        assert_eq!(source.adapter_type(), AdapterType::Embedded);
        match source {
            StoreSource::Embedded(cfg) => assert_eq!(cfg.max_connections, 1),
            StoreSource::Remote(_) => panic!("expected embedded source"),
        }
    }

    #[test]
    fn test_remote_config_builder() {
        let cfg = RemoteConfig::new("http://localhost:8001/api")
            .with_timeout(5)
            .with_header("x-office", "erbil");
        assert_eq!(cfg.timeout_secs, 5);
        assert_eq!(cfg.headers.get("x-office").map(String::as_str), Some("erbil"));
    }

    #[test]
    fn test_source_serde_tagging() {
        let json = serde_json::to_value(StoreSource::Remote(RemoteConfig::new("http://x/api"))).unwrap();
        assert_eq!(json["kind"], "remote");
        assert_eq!(json["base_url"], "http://x/api");
    }
}
