//! Queries per record collection
//!
//! Each module exposes plain async functions over a `SqliteConnection`, so
//! the same queries run inside whatever transaction the caller holds. Rows
//! are read into the private types of [`rows`] and converted to the domain
//! records there.
//!
//! Inserts take the id to use; ids are allocated by the store as
//! `max(id) + 1` within the same transaction.

pub(crate) mod rows;

pub mod houses;
pub mod receipts;
pub mod contracts;
pub mod payments;
pub mod resale;

use domain_sales::ports::Collection;
use sqlx::SqliteConnection;

use crate::error::DatabaseError;

/// `max(id) + 1` for the collection's table, 1 when it is empty
pub async fn next_id(conn: &mut SqliteConnection, collection: Collection) -> Result<i64, DatabaseError> {
    let next: i64 = sqlx::query_scalar(&format!(
        "SELECT COALESCE(MAX(id), 0) + 1 FROM {}",
        collection.name()
    ))
    .fetch_one(&mut *conn)
    .await?;
    Ok(next)
}
