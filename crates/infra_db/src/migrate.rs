//! Schema migrations and evolution
//!
//! Migrations under `migrations/` create the tables. Files written by older
//! releases already have the tables but lack the columns added since;
//! [`evolve_schema`] adds each missing column and leaves existing ones
//! alone, so it is safe to run on every start.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DatabaseError;

/// Columns added after the first release, in the order they were introduced
pub const EVOLVED_COLUMNS: &[(&str, &str, &str)] = &[
    ("contracts", "next_payment_due_date", "TEXT"),
    ("houses", "floors", "INTEGER"),
    ("houses", "building_material", "TEXT"),
    ("resale", "floors", "INTEGER"),
    ("resale", "building_material", "TEXT"),
    ("contracts", "receipt_id", "INTEGER"),
    ("receipts", "contract_id", "INTEGER"),
];

/// Applies pending migrations, then evolves older tables
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DatabaseError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    let added = evolve_schema(pool).await?;
    info!(columns_added = added, "Database schema ready");
    Ok(())
}

/// Returns true if `table` has a column named `column`
pub async fn column_exists(pool: &SqlitePool, table: &str, column: &str) -> Result<bool, DatabaseError> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM pragma_table_info(?) WHERE name = ?")
        .bind(table)
        .bind(column)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

/// Adds every column of [`EVOLVED_COLUMNS`] that is missing
///
/// Returns the number of columns added.
pub async fn evolve_schema(pool: &SqlitePool) -> Result<usize, DatabaseError> {
    let mut added = 0;
    for (table, column, decl) in EVOLVED_COLUMNS {
        if column_exists(pool, table, column).await? {
            debug!(table, column, "Column present");
            continue;
        }
        let sql = format!("ALTER TABLE {table} ADD COLUMN {column} {decl}");
        sqlx::query(&sql)
            .execute(pool)
            .await
            .map_err(|e| DatabaseError::MigrationFailed(format!("{sql}: {e}")))?;
        info!(table, column, "Column added");
        added += 1;
    }
    Ok(added)
}
