//! Resale listing queries

use chrono::Utc;
use core_kernel::ResaleId;
use domain_sales::resale::{NewResaleListing, ResaleListing};
use sqlx::SqliteConnection;

use super::rows::{convert_all, ResaleRow, RESALE_COLUMNS};
use crate::error::DatabaseError;

/// All listings, most recent contact first
pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<ResaleListing>, DatabaseError> {
    let rows: Vec<ResaleRow> = sqlx::query_as(&format!(
        "SELECT {RESALE_COLUMNS} FROM resale ORDER BY contact_date DESC, id DESC"
    ))
    .fetch_all(&mut *conn)
    .await?;
    convert_all(rows)
}

pub async fn find(conn: &mut SqliteConnection, id: ResaleId) -> Result<Option<ResaleListing>, DatabaseError> {
    let row: Option<ResaleRow> = sqlx::query_as(&format!("SELECT {RESALE_COLUMNS} FROM resale WHERE id = ?"))
        .bind(id.get())
        .fetch_optional(&mut *conn)
        .await?;
    row.map(ResaleListing::try_from).transpose()
}

pub async fn insert(conn: &mut SqliteConnection, id: ResaleId, listing: &NewResaleListing) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        INSERT INTO resale (
            id, house_id, source, mobile_number, contact_date, remaining_amount,
            floors, building_material, additional_specs, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.get())
    .bind(listing.house_id.get())
    .bind(listing.source.trim())
    .bind(listing.mobile_number.trim())
    .bind(listing.contact_date)
    .bind(listing.remaining_amount.map(|m| m.amount().to_string()))
    .bind(listing.floors)
    .bind(listing.building_material.as_deref())
    .bind(listing.additional_specs.as_deref())
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn delete(conn: &mut SqliteConnection, id: ResaleId) -> Result<(), DatabaseError> {
    let result = sqlx::query("DELETE FROM resale WHERE id = ?")
        .bind(id.get())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("ResaleListing", id));
    }
    Ok(())
}
