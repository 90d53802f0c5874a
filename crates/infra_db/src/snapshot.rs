//! Whole-database import
//!
//! An incoming file is never opened in place. It is copied into a staging
//! file, checked, migrated to the current schema and then attached to the
//! live connection, where one transaction swaps every ledger table for the
//! staged rows. A file that fails any step leaves the live data untouched.

use std::path::{Path, PathBuf};

use domain_sales::house::HouseFilter;
use sqlx::{Connection, SqliteConnection};
use tokio::io::AsyncReadExt;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::migrate::run_migrations;
use crate::pool::{create_pool, DatabaseConfig, DatabasePool};
use crate::repositories::{contracts, houses, receipts, resale};

const SQLITE_HEADER: &[u8; 16] = b"SQLite format 3\0";

/// Ledger tables with their columns, parents before children
const LEDGER_TABLES: &[(&str, &str)] = &[
    (
        "houses",
        "id, house_number, block_number, total_area, building_area, total_price, down_payment, \
         loan_amount, phase, outlook, floors, building_material, additional_specs, status, created_at",
    ),
    (
        "receipts",
        "id, receipt_number, receipt_date, buyer_name, mobile_number, unit_number, block_number, \
         unit_area, amount_received, remaining_amount, due_date, notes, house_id, contract_id, created_at",
    ),
    (
        "contracts",
        "id, sale_date, house_number, block_number, area, floors, buyer_name, mobile_number, sale_type, \
         total_amount, down_payment, loan_amount, amount_paid, contract_date, contract_number, \
         buyer_signature, investor_signature, contract_receipt, next_payment_due_date, house_id, \
         receipt_id, created_at",
    ),
    (
        "resale",
        "id, house_id, source, mobile_number, contact_date, remaining_amount, floors, building_material, \
         additional_specs, created_at",
    ),
    (
        "payments",
        "id, contract_id, payment_date, amount, payment_type, notes, next_payment_due_date, created_at",
    ),
];

/// Row counts of an imported database
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub houses: u64,
    pub receipts: u64,
    pub contracts: u64,
    pub payments: u64,
    pub resale: u64,
}

impl ImportSummary {
    fn record(&mut self, table: &str, rows: u64) {
        match table {
            "houses" => self.houses = rows,
            "receipts" => self.receipts = rows,
            "contracts" => self.contracts = rows,
            "payments" => self.payments = rows,
            _ => self.resale = rows,
        }
    }
}

/// Scratch path for staging a database copy
pub(crate) fn staging_path(purpose: &str) -> PathBuf {
    std::env::temp_dir().join(format!("realty-{purpose}-{}.db", Uuid::new_v4()))
}

/// Removes a database file together with its WAL companions
pub(crate) async fn remove_database_file(path: &Path) {
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.as_os_str().to_owned();
        file.push(suffix);
        let _ = tokio::fs::remove_file(PathBuf::from(file)).await;
    }
}

/// Replaces the live ledger with the contents of `source`
#[instrument(skip(live), fields(source = %source.display()))]
pub async fn import_into(live: &DatabasePool, source: &Path) -> Result<ImportSummary, DatabaseError> {
    if !tokio::fs::try_exists(source).await.unwrap_or(false) {
        return Err(DatabaseError::SnapshotFailed(format!("{} does not exist", source.display())));
    }

    let staged = staging_path("import");
    let result = async {
        tokio::fs::copy(source, &staged)
            .await
            .map_err(|e| DatabaseError::SnapshotFailed(format!("staging {}: {e}", source.display())))?;
        prepare(&staged).await?;
        swap_in(live, &staged).await
    }
    .await;
    remove_database_file(&staged).await;

    match &result {
        Ok(summary) => info!(?summary, "Database imported"),
        Err(e) => warn!(error = %e, "Database import rejected"),
    }
    result
}

/// Checks the staged file and brings its schema up to date
async fn prepare(staged: &Path) -> Result<(), DatabaseError> {
    let mut file = tokio::fs::File::open(staged)
        .await
        .map_err(|e| DatabaseError::SnapshotFailed(e.to_string()))?;
    let mut header = [0u8; 16];
    if file.read_exact(&mut header).await.is_err() || &header != SQLITE_HEADER {
        return Err(DatabaseError::SnapshotFailed("not a SQLite database".to_string()));
    }

    let pool = create_pool(DatabaseConfig::new(staged)).await?;
    let checked = check_and_migrate(&pool).await;
    pool.close().await;
    checked
}

async fn check_and_migrate(pool: &DatabasePool) -> Result<(), DatabaseError> {
    let integrity: String = sqlx::query_scalar("PRAGMA integrity_check")
        .fetch_one(pool)
        .await
        .map_err(|e| DatabaseError::SnapshotFailed(e.to_string()))?;
    if integrity != "ok" {
        return Err(DatabaseError::SnapshotFailed(format!("integrity check failed: {integrity}")));
    }

    let has_houses: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'houses'")
            .fetch_optional(pool)
            .await?;
    if has_houses.is_none() {
        return Err(DatabaseError::SnapshotFailed("file holds no ledger tables".to_string()));
    }

    run_migrations(pool).await
}

/// Copies every ledger table of `staged` over the live one
///
/// Foreign keys stay off for the copy. `ATTACH` and `DETACH` must run
/// outside the transaction.
async fn swap_in(live: &DatabasePool, staged: &Path) -> Result<ImportSummary, DatabaseError> {
    let staged_str = staged
        .to_str()
        .ok_or_else(|| DatabaseError::SnapshotFailed("path is not valid UTF-8".to_string()))?;

    let mut conn = live.acquire().await?;
    sqlx::query("PRAGMA foreign_keys = OFF").execute(&mut *conn).await?;
    let attached = sqlx::query("ATTACH DATABASE ? AS incoming")
        .bind(staged_str)
        .execute(&mut *conn)
        .await;

    let copied = match attached {
        Ok(_) => {
            let copied = copy_tables(&mut *conn).await;
            if let Err(e) = sqlx::query("DETACH DATABASE incoming").execute(&mut *conn).await {
                warn!(error = %e, "Detaching imported file failed");
            }
            copied
        }
        Err(e) => Err(DatabaseError::SnapshotFailed(e.to_string())),
    };

    sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
    copied
}

async fn copy_tables(conn: &mut SqliteConnection) -> Result<ImportSummary, DatabaseError> {
    let mut tx = conn.begin().await?;

    for (table, _) in LEDGER_TABLES.iter().rev() {
        sqlx::query(&format!("DELETE FROM main.{table}")).execute(&mut *tx).await?;
    }

    let mut summary = ImportSummary::default();
    for (table, columns) in LEDGER_TABLES {
        let copied = sqlx::query(&format!(
            "INSERT INTO main.{table} ({columns}) SELECT {columns} FROM incoming.{table}"
        ))
        .execute(&mut *tx)
        .await?
        .rows_affected();
        debug!(table, rows = copied, "Table copied");
        summary.record(table, copied);
    }

    // Every record has to read back as a domain value before the swap sticks
    houses::list(&mut *tx, &HouseFilter::default()).await?;
    receipts::list(&mut *tx).await?;
    contracts::list(&mut *tx).await?;
    resale::list(&mut *tx).await?;

    tx.commit().await?;
    Ok(summary)
}
