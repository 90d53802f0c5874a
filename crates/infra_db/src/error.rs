//! Database error types
//!
//! This module defines the errors raised by the SQLite layer and their
//! translation into the storage port's [`PortError`].

use core_kernel::PortError;
use sqlx::error::ErrorKind;
use thiserror::Error;

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to open the database file
    #[error("Failed to open database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Entity not found in database
    #[error("{entity} with id '{id}' not found")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// NOT NULL or CHECK constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Another connection holds the write lock
    #[error("Database is busy: {0}")]
    Busy(String),

    /// Migration or schema evolution error
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A stored value could not be read back as a domain value
    #[error("Corrupt value in {table}.{column}: {message}")]
    CorruptValue {
        table: &'static str,
        column: &'static str,
        message: String,
    },

    /// Writing a snapshot copy failed
    #[error("Snapshot failed: {0}")]
    SnapshotFailed(String),

    /// Pool exhaustion - the single connection stayed busy too long
    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl DatabaseError {
    /// Creates a not found error for a specific entity type and identifier
    ///
    /// # Example
    ///
    /// ```rust
    /// use infra_db::DatabaseError;
    ///
    /// let error = DatabaseError::not_found("House", 12);
    /// assert!(error.to_string().contains("House"));
    /// ```
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn corrupt(table: &'static str, column: &'static str, message: impl Into<String>) -> Self {
        DatabaseError::CorruptValue {
            table,
            column,
            message: message.into(),
        }
    }

    /// Checks if this error indicates a record was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound { .. })
    }

    /// Checks if this error is a constraint violation
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::DuplicateEntry(_)
                | DatabaseError::ForeignKeyViolation(_)
                | DatabaseError::ConstraintViolation(_)
        )
    }

    /// Checks if this error is a connection-related issue
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted | DatabaseError::Busy(_)
        )
    }
}

/// Maps SQLx errors onto the specific variants
///
/// Constraint violations are classified by their kind; SQLite result codes
/// 5 (`SQLITE_BUSY`) and 6 (`SQLITE_LOCKED`) become [`DatabaseError::Busy`].
impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => DatabaseError::not_found("Record", "unknown"),
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::Io(e) => DatabaseError::ConnectionFailed(e.to_string()),
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    ErrorKind::UniqueViolation => DatabaseError::DuplicateEntry(message),
                    ErrorKind::ForeignKeyViolation => DatabaseError::ForeignKeyViolation(message),
                    ErrorKind::NotNullViolation | ErrorKind::CheckViolation => {
                        DatabaseError::ConstraintViolation(message)
                    }
                    _ => match db_err.code().as_deref() {
                        Some("5") | Some("6") => DatabaseError::Busy(message),
                        _ => DatabaseError::QueryFailed(message),
                    },
                }
            }
            other => DatabaseError::QueryFailed(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        DatabaseError::MigrationFailed(error.to_string())
    }
}

/// Translates database errors for the storage port
///
/// Lock contention and pool exhaustion are reported as connection errors so
/// that callers treat them as transient.
impl From<DatabaseError> for PortError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::NotFound { entity, id } => PortError::NotFound {
                entity_type: entity,
                id,
            },
            DatabaseError::DuplicateEntry(msg)
            | DatabaseError::ForeignKeyViolation(msg)
            | DatabaseError::ConstraintViolation(msg) => PortError::Conflict { message: msg },
            e @ (DatabaseError::ConnectionFailed(_) | DatabaseError::Busy(_) | DatabaseError::PoolExhausted) => {
                PortError::Connection {
                    message: e.to_string(),
                    source: Some(Box::new(e)),
                }
            }
            e @ DatabaseError::CorruptValue { .. } => PortError::transformation(e.to_string()),
            other => PortError::Internal {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}
