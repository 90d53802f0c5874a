//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! sales ledger test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data for common records
//! - `builders`: Builder patterns for input records
//! - `database`: In-memory and file-backed ledgers wired to a fixed clock
//! - `assertions`: Custom assertion helpers for domain types
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
