//! Database connection pool management
//!
//! The ledger lives in a single SQLite file. The pool holds one connection
//! by default so that every transaction runs against the same writer; a
//! second connection would only wait on the file lock.

use std::path::PathBuf;
use std::time::Duration;

use core_kernel::EmbeddedConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use tracing::{info, warn};

use crate::error::DatabaseError;

/// Type alias for the SQLite connection pool
pub type DatabasePool = SqlitePool;

/// Configuration options for the database connection pool
///
/// # Example
///
/// ```rust
/// use infra_db::DatabaseConfig;
/// use std::time::Duration;
///
/// let config = DatabaseConfig::new("realty.db")
///     .max_connections(1)
///     .busy_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database file, created on first open
    pub path: PathBuf,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// How long SQLite waits on a locked file before failing
    pub busy_timeout: Duration,
    /// How long a caller waits for the pooled connection
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    /// Creates a configuration for the given file with single-writer defaults
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_connections: 1,
            busy_timeout: Duration::from_secs(5),
            acquire_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the maximum number of connections in the pool
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::from(&EmbeddedConfig::default())
    }
}

impl From<&EmbeddedConfig> for DatabaseConfig {
    fn from(config: &EmbeddedConfig) -> Self {
        Self::new(config.path.clone()).max_connections(config.max_connections)
    }
}

/// Opens (creating if needed) the database file
///
/// The file runs in WAL mode with full synchronous writes and foreign keys
/// enforced.
///
/// # Errors
///
/// Returns `DatabaseError::ConnectionFailed` if the file cannot be opened
pub async fn create_pool(config: DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    info!(
        path = %config.path.display(),
        max_connections = config.max_connections,
        "Opening database"
    );

    let options = SqliteConnectOptions::new()
        .filename(&config.path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Full)
        .foreign_keys(true)
        .busy_timeout(config.busy_timeout);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(options)
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

    log_effective_pragmas(&pool).await;
    Ok(pool)
}

/// Creates a private in-memory database
///
/// The single connection is never recycled, since closing it would discard
/// the data.
pub async fn create_memory_pool() -> Result<DatabasePool, DatabaseError> {
    let options = SqliteConnectOptions::new()
        .in_memory(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))
}

async fn log_effective_pragmas(pool: &DatabasePool) {
    let version: String = sqlx::query_scalar("SELECT sqlite_version()")
        .fetch_one(pool)
        .await
        .unwrap_or_else(|_| "unknown".to_string());

    let journal_mode: String = sqlx::query_scalar("PRAGMA journal_mode")
        .fetch_one(pool)
        .await
        .unwrap_or_else(|_| "unknown".to_string());

    let foreign_keys: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
        .fetch_one(pool)
        .await
        .unwrap_or(i64::MIN);

    info!(sqlite_version = %version, %journal_mode, foreign_keys, "Database opened");

    if !journal_mode.eq_ignore_ascii_case("wal") {
        warn!(%journal_mode, "journal_mode is not WAL; running with reduced crash safety");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = DatabaseConfig::new("ledger.db")
            .max_connections(0)
            .busy_timeout(Duration::from_secs(60));

        assert_eq!(config.max_connections, 1);
        assert_eq!(config.busy_timeout, Duration::from_secs(60));
        assert_eq!(config.path, PathBuf::from("ledger.db"));
    }

    #[test]
    fn test_from_embedded_config() {
        let embedded = EmbeddedConfig {
            path: PathBuf::from("/srv/realty/realty.db"),
            max_connections: 2,
        };
        let config = DatabaseConfig::from(&embedded);
        assert_eq!(config.path, embedded.path);
        assert_eq!(config.max_connections, 2);
    }

    #[tokio::test]
    async fn test_memory_pool_answers() {
        let pool = create_memory_pool().await.unwrap();
        let one: i64 = sqlx::query_scalar("SELECT 1").fetch_one(&pool).await.unwrap();
        assert_eq!(one, 1);
    }
}
