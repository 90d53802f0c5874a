//! SQLite record store
//!
//! Implements the storage port of the sales domain over a single SQLite
//! file. Every [`RecordTx`] wraps one SQLite transaction; dropping it
//! without calling `commit` rolls back.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{DatabaseConfig, SqliteRecordStore};
//! use domain_sales::LocalSalesService;
//! use std::sync::Arc;
//!
//! let store = SqliteRecordStore::open(DatabaseConfig::new("realty.db")).await?;
//! let service = LocalSalesService::new(Arc::new(store), clock);
//! ```

use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use sqlx::{Sqlite, Transaction};
use tracing::{debug, info, instrument};

use core_kernel::{
    AdapterType, ContractId, DomainPort, HealthCheckResult, HealthCheckable, HouseId, Money,
    PaymentId, PortError, ReceiptId, ResaleId,
};
use domain_sales::contract::{Contract, ContractLinks, NewContract};
use domain_sales::house::{House, HouseFilter, HouseStatus, NewHouse};
use domain_sales::payment::{NewPayment, Payment};
use domain_sales::ports::{Collection, RecordStore, RecordTx};
use domain_sales::receipt::{NewReceipt, Receipt};
use domain_sales::resale::{NewResaleListing, ResaleListing};

use crate::error::DatabaseError;
use crate::migrate::run_migrations;
use crate::pool::{create_memory_pool, create_pool, DatabaseConfig, DatabasePool};
use crate::repositories::{self, contracts, houses, payments, receipts, resale};
use crate::snapshot::{self, ImportSummary};

const ADAPTER_ID: &str = "sqlite";

/// Record store over a SQLite file
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    pool: DatabasePool,
}

impl SqliteRecordStore {
    /// Wraps an already migrated pool
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Opens the file, applies migrations and evolves older schemas
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::ConnectionFailed` if the file cannot be opened
    /// and `DatabaseError::MigrationFailed` if the schema cannot be brought
    /// up to date.
    pub async fn open(config: DatabaseConfig) -> Result<Self, DatabaseError> {
        let pool = create_pool(config).await?;
        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Fresh private in-memory store with the full schema
    pub async fn in_memory() -> Result<Self, DatabaseError> {
        let pool = create_memory_pool().await?;
        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Returns the underlying pool
    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Writes a consistent copy of the whole database to `target`
    ///
    /// Uses `VACUUM INTO`, so the copy is compacted and reflects only
    /// committed data. The target must not exist yet.
    #[instrument(skip(self), fields(target = %target.display()))]
    pub async fn export_snapshot(&self, target: &Path) -> Result<(), DatabaseError> {
        if tokio::fs::try_exists(target).await.unwrap_or(false) {
            return Err(DatabaseError::SnapshotFailed(format!(
                "{} already exists",
                target.display()
            )));
        }
        let target_str = target
            .to_str()
            .ok_or_else(|| DatabaseError::SnapshotFailed("path is not valid UTF-8".to_string()))?;

        sqlx::query("VACUUM INTO ?")
            .bind(target_str)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::SnapshotFailed(e.to_string()))?;

        info!("Snapshot written");
        Ok(())
    }

    /// Snapshot of the whole database as file bytes
    pub async fn export_bytes(&self) -> Result<Vec<u8>, DatabaseError> {
        let target = snapshot::staging_path("export");
        let result = async {
            self.export_snapshot(&target).await?;
            tokio::fs::read(&target)
                .await
                .map_err(|e| DatabaseError::SnapshotFailed(e.to_string()))
        }
        .await;
        snapshot::remove_database_file(&target).await;
        result
    }

    /// Replaces every record with the contents of the database at `source`
    ///
    /// The file is checked for integrity and migrated to the current schema
    /// on a staging copy first; `source` itself is only read. Nothing
    /// changes unless the whole file is accepted.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::SnapshotFailed` if the file is not a ledger
    /// database, and `DatabaseError::CorruptValue` if a record in it cannot
    /// be read back.
    pub async fn import_snapshot(&self, source: &Path) -> Result<ImportSummary, DatabaseError> {
        snapshot::import_into(&self.pool, source).await
    }

    /// [`import_snapshot`](Self::import_snapshot) for uploaded bytes
    pub async fn import_bytes(&self, bytes: &[u8]) -> Result<ImportSummary, DatabaseError> {
        let upload = snapshot::staging_path("upload");
        let result = async {
            tokio::fs::write(&upload, bytes)
                .await
                .map_err(|e| DatabaseError::SnapshotFailed(e.to_string()))?;
            self.import_snapshot(&upload).await
        }
        .await;
        snapshot::remove_database_file(&upload).await;
        result
    }

    /// Closes every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl DomainPort for SqliteRecordStore {}

#[async_trait]
impl HealthCheckable for SqliteRecordStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let result = sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&self.pool).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult::healthy(ADAPTER_ID, AdapterType::Embedded, latency_ms),
            Err(e) => HealthCheckResult::unhealthy(
                ADAPTER_ID,
                AdapterType::Embedded,
                latency_ms,
                format!("Database error: {e}"),
            ),
        }
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn begin(&self) -> Result<Box<dyn RecordTx>, PortError> {
        let tx = self.pool.begin().await.map_err(DatabaseError::from)?;
        Ok(Box::new(SqliteRecordTx { tx }))
    }
}

/// One SQLite transaction
pub struct SqliteRecordTx {
    tx: Transaction<'static, Sqlite>,
}

impl SqliteRecordTx {
    async fn allocate<T: From<i64>>(&mut self, collection: Collection) -> Result<T, PortError> {
        Ok(T::from(repositories::next_id(&mut *self.tx, collection).await?))
    }

    async fn reload_house(&mut self, id: HouseId) -> Result<House, PortError> {
        houses::find(&mut *self.tx, id)
            .await?
            .ok_or_else(|| PortError::internal(format!("house {id} vanished after write")))
    }

    async fn reload_contract(&mut self, id: ContractId) -> Result<Contract, PortError> {
        contracts::find(&mut *self.tx, id)
            .await?
            .ok_or_else(|| PortError::internal(format!("contract {id} vanished after write")))
    }
}

#[async_trait]
impl RecordTx for SqliteRecordTx {
    async fn houses(&mut self, filter: &HouseFilter) -> Result<Vec<House>, PortError> {
        Ok(houses::list(&mut *self.tx, filter).await?)
    }

    async fn house(&mut self, id: HouseId) -> Result<Option<House>, PortError> {
        Ok(houses::find(&mut *self.tx, id).await?)
    }

    async fn house_by_number(&mut self, house_number: i64) -> Result<Option<House>, PortError> {
        Ok(houses::find_by_number(&mut *self.tx, house_number).await?)
    }

    async fn max_house_number(&mut self) -> Result<Option<i64>, PortError> {
        Ok(houses::max_number(&mut *self.tx).await?)
    }

    async fn insert_house(&mut self, house: &NewHouse) -> Result<House, PortError> {
        let id: HouseId = self.allocate(Collection::Houses).await?;
        houses::insert(&mut *self.tx, id, house).await?;
        debug!(house_id = %id, "House row inserted");
        self.reload_house(id).await
    }

    async fn update_house(&mut self, id: HouseId, house: &NewHouse) -> Result<House, PortError> {
        houses::update(&mut *self.tx, id, house).await?;
        self.reload_house(id).await
    }

    async fn set_house_status(&mut self, id: HouseId, status: HouseStatus) -> Result<(), PortError> {
        Ok(houses::set_status(&mut *self.tx, id, status).await?)
    }

    async fn receipts(&mut self) -> Result<Vec<Receipt>, PortError> {
        Ok(receipts::list(&mut *self.tx).await?)
    }

    async fn receipt(&mut self, id: ReceiptId) -> Result<Option<Receipt>, PortError> {
        Ok(receipts::find(&mut *self.tx, id).await?)
    }

    async fn receipt_by_number(&mut self, receipt_number: i64) -> Result<Option<Receipt>, PortError> {
        Ok(receipts::find_by_number(&mut *self.tx, receipt_number).await?)
    }

    async fn insert_receipt(&mut self, receipt: &NewReceipt) -> Result<Receipt, PortError> {
        let id: ReceiptId = self.allocate(Collection::Receipts).await?;
        receipts::insert(&mut *self.tx, id, receipt).await?;
        debug!(receipt_id = %id, "Receipt row inserted");
        receipts::find(&mut *self.tx, id)
            .await?
            .ok_or_else(|| PortError::internal(format!("receipt {id} vanished after write")))
    }

    async fn link_receipt(&mut self, id: ReceiptId, contract_id: Option<ContractId>) -> Result<(), PortError> {
        Ok(receipts::set_contract(&mut *self.tx, id, contract_id).await?)
    }

    async fn delete_receipt(&mut self, id: ReceiptId) -> Result<(), PortError> {
        Ok(receipts::delete(&mut *self.tx, id).await?)
    }

    async fn contracts(&mut self) -> Result<Vec<Contract>, PortError> {
        Ok(contracts::list(&mut *self.tx).await?)
    }

    async fn contract(&mut self, id: ContractId) -> Result<Option<Contract>, PortError> {
        Ok(contracts::find(&mut *self.tx, id).await?)
    }

    async fn contract_by_number(&mut self, contract_number: i64) -> Result<Option<Contract>, PortError> {
        Ok(contracts::find_by_number(&mut *self.tx, contract_number).await?)
    }

    async fn contracts_for_house(&mut self, house_id: HouseId) -> Result<Vec<Contract>, PortError> {
        Ok(contracts::list_for_house(&mut *self.tx, house_id).await?)
    }

    async fn next_contract_number(&mut self) -> Result<i64, PortError> {
        Ok(contracts::next_number(&mut *self.tx).await?)
    }

    async fn insert_contract(&mut self, contract: &NewContract, links: ContractLinks) -> Result<Contract, PortError> {
        let id: ContractId = self.allocate(Collection::Contracts).await?;
        contracts::insert(&mut *self.tx, id, contract, links).await?;
        debug!(contract_id = %id, "Contract row inserted");
        self.reload_contract(id).await
    }

    async fn update_contract(
        &mut self,
        id: ContractId,
        contract: &NewContract,
        links: ContractLinks,
    ) -> Result<Contract, PortError> {
        contracts::update(&mut *self.tx, id, contract, links).await?;
        self.reload_contract(id).await
    }

    async fn set_amount_paid(&mut self, id: ContractId, amount_paid: Money) -> Result<(), PortError> {
        Ok(contracts::set_amount_paid(&mut *self.tx, id, amount_paid).await?)
    }

    async fn delete_contract(&mut self, id: ContractId) -> Result<(), PortError> {
        Ok(contracts::delete(&mut *self.tx, id).await?)
    }

    async fn payments_for_contract(&mut self, contract_id: ContractId) -> Result<Vec<Payment>, PortError> {
        Ok(payments::list_for_contract(&mut *self.tx, contract_id).await?)
    }

    async fn payment(&mut self, id: PaymentId) -> Result<Option<Payment>, PortError> {
        Ok(payments::find(&mut *self.tx, id).await?)
    }

    async fn insert_payment(&mut self, payment: &NewPayment) -> Result<Payment, PortError> {
        let id: PaymentId = self.allocate(Collection::Payments).await?;
        payments::insert(&mut *self.tx, id, payment).await?;
        payments::find(&mut *self.tx, id)
            .await?
            .ok_or_else(|| PortError::internal(format!("payment {id} vanished after write")))
    }

    async fn delete_payment(&mut self, id: PaymentId) -> Result<(), PortError> {
        Ok(payments::delete(&mut *self.tx, id).await?)
    }

    async fn delete_payments_for_contract(&mut self, contract_id: ContractId) -> Result<u64, PortError> {
        Ok(payments::delete_for_contract(&mut *self.tx, contract_id).await?)
    }

    async fn resale_listings(&mut self) -> Result<Vec<ResaleListing>, PortError> {
        Ok(resale::list(&mut *self.tx).await?)
    }

    async fn resale_listing(&mut self, id: ResaleId) -> Result<Option<ResaleListing>, PortError> {
        Ok(resale::find(&mut *self.tx, id).await?)
    }

    async fn insert_resale(&mut self, listing: &NewResaleListing) -> Result<ResaleListing, PortError> {
        let id: ResaleId = self.allocate(Collection::Resale).await?;
        resale::insert(&mut *self.tx, id, listing).await?;
        resale::find(&mut *self.tx, id)
            .await?
            .ok_or_else(|| PortError::internal(format!("resale listing {id} vanished after write")))
    }

    async fn delete_resale(&mut self, id: ResaleId) -> Result<(), PortError> {
        Ok(resale::delete(&mut *self.tx, id).await?)
    }

    async fn commit(self: Box<Self>) -> Result<(), PortError> {
        self.tx.commit().await.map_err(DatabaseError::from)?;
        Ok(())
    }
}
