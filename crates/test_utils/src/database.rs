//! Database Test Utilities
//!
//! Provides ledgers backed by a private in-memory SQLite database or by a
//! throwaway file, wired to a fixed clock so that overdue and statistics
//! figures are deterministic.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use core_kernel::FixedClock;
use domain_sales::overdue::{DueDatePolicy, OverdueEngine};
use domain_sales::ports::SalesPort;
use domain_sales::services::LocalSalesService;
use infra_db::{DatabaseConfig, DatabaseError, SqliteRecordStore};
use uuid::Uuid;

use crate::fixtures::DateFixtures;

/// A complete local ledger for one test
pub struct TestLedger {
    pub store: Arc<SqliteRecordStore>,
    pub service: Arc<LocalSalesService>,
    pub clock: Arc<FixedClock>,
}

impl TestLedger {
    /// In-memory ledger whose clock reads [`DateFixtures::today`]
    pub async fn new() -> Result<Self, DatabaseError> {
        Self::at(DateFixtures::today()).await
    }

    /// In-memory ledger whose clock reads `today`
    pub async fn at(today: NaiveDate) -> Result<Self, DatabaseError> {
        let store = SqliteRecordStore::in_memory().await?;
        Ok(Self::assemble(store, today))
    }

    /// Ledger over an existing store
    pub fn assemble(store: SqliteRecordStore, today: NaiveDate) -> Self {
        let store = Arc::new(store);
        let clock = Arc::new(FixedClock::new(today));
        let service = Arc::new(LocalSalesService::new(store.clone(), clock.clone()));
        Self { store, service, clock }
    }

    /// The service as the application port
    pub fn port(&self) -> Arc<dyn SalesPort> {
        self.service.clone()
    }

    /// Overdue engine over this ledger
    pub fn overdue(&self, policy: DueDatePolicy) -> OverdueEngine {
        OverdueEngine::new(self.port(), self.clock.clone(), policy)
    }
}

/// A scratch directory removed on drop
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Creates a fresh directory under the system temp dir
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be created.
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("realty-test-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&path).expect("create scratch dir");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a file inside the directory
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Database configuration for a file inside the directory
    pub fn database(&self, name: &str) -> DatabaseConfig {
        DatabaseConfig::new(self.file(name))
    }
}

impl Default for ScratchDir {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Clock;

    #[tokio::test]
    async fn test_ledger_clock_is_fixed() {
        let ledger = TestLedger::new().await.unwrap();
        assert_eq!(ledger.clock.today(), DateFixtures::today());
    }

    #[test]
    fn test_scratch_dir_is_removed() {
        let path = {
            let dir = ScratchDir::new();
            assert!(dir.path().exists());
            dir.path().to_path_buf()
        };
        assert!(!path.exists());
    }
}
