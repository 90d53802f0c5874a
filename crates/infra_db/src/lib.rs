//! Infrastructure Database Layer
//!
//! This crate stores the sales ledger in a single SQLite file using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern. Each module under
//! [`repositories`] holds the queries of one collection and works on a bare
//! connection, so the same function runs inside any transaction.
//! [`SqliteRecordStore`] ties them together behind the domain's
//! [`RecordStore`](domain_sales::RecordStore) port.
//!
//! # Schema
//!
//! Tables are created by the migrations under `migrations/`. Files written
//! by older releases are brought up to date column by column on open, see
//! [`migrate::evolve_schema`].
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{DatabaseConfig, SqliteRecordStore};
//!
//! let store = SqliteRecordStore::open(DatabaseConfig::new("realty.db")).await?;
//! let mut tx = store.begin().await?;
//! let houses = tx.houses(&HouseFilter::default()).await?;
//! ```

pub mod pool;
pub mod error;
pub mod migrate;
pub mod repositories;
pub mod snapshot;
pub mod store;

pub use pool::{create_memory_pool, create_pool, DatabaseConfig, DatabasePool};
pub use error::DatabaseError;
pub use migrate::run_migrations;
pub use snapshot::ImportSummary;
pub use store::{SqliteRecordStore, SqliteRecordTx};
