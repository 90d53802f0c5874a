//! API configuration
//!
//! Values come from an optional `realty.toml` next to the binary and from
//! environment variables prefixed `REALTY_` (`REALTY_PORT=9000`), the latter
//! taking precedence. Unset keys keep their defaults.

use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use core_kernel::{EmbeddedConfig, RemoteConfig, StoreSource, Timezone};
use domain_sales::overdue::{DueDatePolicy, SearchScope, DEFAULT_TERM_DAYS};
use serde::Deserialize;

/// Which backend holds the records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    #[default]
    Embedded,
    Remote,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    pub store: StoreKind,
    /// Database file of the embedded store
    pub database_path: PathBuf,
    pub max_connections: u32,
    /// Base URL of the remote backend, including `/api`
    pub remote_base_url: Option<String>,
    pub remote_timeout_secs: u64,
    /// Directory receiving a database copy on shutdown; none when unset
    pub snapshot_dir: Option<PathBuf>,
    /// Time zone of the sales office, decides "today"
    pub timezone: Timezone,
    pub due_term_days: u32,
    pub honor_payment_due_override: bool,
    pub search_scope: SearchScope,
    /// Log level
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
            store: StoreKind::Embedded,
            database_path: PathBuf::from("realty.db"),
            max_connections: 1,
            remote_base_url: None,
            remote_timeout_secs: 30,
            snapshot_dir: None,
            timezone: Timezone::default(),
            due_term_days: DEFAULT_TERM_DAYS,
            honor_payment_due_override: false,
            search_scope: SearchScope::OpenBalances,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `realty.toml` and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("realty").required(false))
            .add_source(Environment::with_prefix("REALTY").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Resolves the configured backend
    ///
    /// # Errors
    ///
    /// A remote store without `remote_base_url` is rejected.
    pub fn store_source(&self) -> Result<StoreSource, ConfigError> {
        match self.store {
            StoreKind::Embedded => Ok(StoreSource::Embedded(EmbeddedConfig {
                path: self.database_path.clone(),
                max_connections: self.max_connections.max(1),
            })),
            StoreKind::Remote => {
                let base_url = self
                    .remote_base_url
                    .clone()
                    .filter(|url| !url.trim().is_empty())
                    .ok_or_else(|| ConfigError::NotFound("remote_base_url".to_string()))?;
                Ok(StoreSource::Remote(
                    RemoteConfig::new(base_url).with_timeout(self.remote_timeout_secs),
                ))
            }
        }
    }

    pub fn due_date_policy(&self) -> DueDatePolicy {
        DueDatePolicy {
            term_days: self.due_term_days,
            honor_payment_override: self.honor_payment_due_override,
            search_scope: self.search_scope,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.server_addr(), "0.0.0.0:8001");
        assert_eq!(config.due_date_policy(), DueDatePolicy::default());
        assert!(matches!(config.store_source(), Ok(StoreSource::Embedded(_))));
    }

    #[test]
    fn test_remote_requires_base_url() {
        let config = ApiConfig {
            store: StoreKind::Remote,
            ..Default::default()
        };
        assert!(config.store_source().is_err());

        let config = ApiConfig {
            store: StoreKind::Remote,
            remote_base_url: Some("http://10.0.0.5:8001/api".to_string()),
            remote_timeout_secs: 5,
            ..Default::default()
        };
        match config.store_source() {
            Ok(StoreSource::Remote(remote)) => {
                assert_eq!(remote.base_url, "http://10.0.0.5:8001/api");
                assert_eq!(remote.timeout_secs, 5);
            }
            other => panic!("expected remote source, got {other:?}"),
        }
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let config: ApiConfig = Config::builder()
            .add_source(File::from_str(
                "port = 9000\nsearch_scope = \"overdue_only\"\ntimezone = \"Europe/Berlin\"\nlog_format = \"json\"",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.search_scope, SearchScope::OverdueOnly);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.due_term_days, DEFAULT_TERM_DAYS);
    }
}
