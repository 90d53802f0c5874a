//! Receipt queries

use chrono::Utc;
use core_kernel::{ContractId, ReceiptId};
use domain_sales::receipt::{NewReceipt, Receipt};
use sqlx::SqliteConnection;

use super::rows::{convert_all, ReceiptRow, RECEIPT_COLUMNS};
use crate::error::DatabaseError;

/// All receipts, newest first by date then number
pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Receipt>, DatabaseError> {
    let rows: Vec<ReceiptRow> = sqlx::query_as(&format!(
        "SELECT {RECEIPT_COLUMNS} FROM receipts ORDER BY receipt_date DESC, receipt_number DESC"
    ))
    .fetch_all(&mut *conn)
    .await?;
    convert_all(rows)
}

pub async fn find(conn: &mut SqliteConnection, id: ReceiptId) -> Result<Option<Receipt>, DatabaseError> {
    let row: Option<ReceiptRow> = sqlx::query_as(&format!("SELECT {RECEIPT_COLUMNS} FROM receipts WHERE id = ?"))
        .bind(id.get())
        .fetch_optional(&mut *conn)
        .await?;
    row.map(Receipt::try_from).transpose()
}

pub async fn find_by_number(conn: &mut SqliteConnection, receipt_number: i64) -> Result<Option<Receipt>, DatabaseError> {
    let row: Option<ReceiptRow> =
        sqlx::query_as(&format!("SELECT {RECEIPT_COLUMNS} FROM receipts WHERE receipt_number = ?"))
            .bind(receipt_number)
            .fetch_optional(&mut *conn)
            .await?;
    row.map(Receipt::try_from).transpose()
}

/// Inserts a receipt without a contract link
pub async fn insert(conn: &mut SqliteConnection, id: ReceiptId, receipt: &NewReceipt) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        INSERT INTO receipts (
            id, receipt_number, receipt_date, buyer_name, mobile_number, unit_number,
            block_number, unit_area, amount_received, remaining_amount, due_date, notes,
            house_id, contract_id, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?)
        "#,
    )
    .bind(id.get())
    .bind(receipt.receipt_number)
    .bind(receipt.receipt_date)
    .bind(receipt.buyer_name.trim())
    .bind(receipt.mobile_number.trim())
    .bind(receipt.unit_number)
    .bind(receipt.block_number)
    .bind(receipt.unit_area.to_string())
    .bind(receipt.amount_received.amount().to_string())
    .bind(receipt.remaining_amount.amount().to_string())
    .bind(receipt.due_date)
    .bind(receipt.notes.as_deref())
    .bind(receipt.house_id.map(|h| h.get()))
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn set_contract(
    conn: &mut SqliteConnection,
    id: ReceiptId,
    contract_id: Option<ContractId>,
) -> Result<(), DatabaseError> {
    let result = sqlx::query("UPDATE receipts SET contract_id = ? WHERE id = ?")
        .bind(contract_id.map(|c| c.get()))
        .bind(id.get())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Receipt", id));
    }
    Ok(())
}

pub async fn delete(conn: &mut SqliteConnection, id: ReceiptId) -> Result<(), DatabaseError> {
    let result = sqlx::query("DELETE FROM receipts WHERE id = ?")
        .bind(id.get())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Receipt", id));
    }
    Ok(())
}
