//! Payment queries

use chrono::Utc;
use core_kernel::{ContractId, PaymentId};
use domain_sales::payment::{NewPayment, Payment};
use sqlx::SqliteConnection;

use super::rows::{convert_all, PaymentRow, PAYMENT_COLUMNS};
use crate::error::DatabaseError;

/// Payments of one contract, newest first
pub async fn list_for_contract(conn: &mut SqliteConnection, contract_id: ContractId) -> Result<Vec<Payment>, DatabaseError> {
    let rows: Vec<PaymentRow> = sqlx::query_as(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE contract_id = ? \
         ORDER BY payment_date DESC, created_at DESC, id DESC"
    ))
    .bind(contract_id.get())
    .fetch_all(&mut *conn)
    .await?;
    convert_all(rows)
}

pub async fn find(conn: &mut SqliteConnection, id: PaymentId) -> Result<Option<Payment>, DatabaseError> {
    let row: Option<PaymentRow> = sqlx::query_as(&format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = ?"))
        .bind(id.get())
        .fetch_optional(&mut *conn)
        .await?;
    row.map(Payment::try_from).transpose()
}

pub async fn insert(conn: &mut SqliteConnection, id: PaymentId, payment: &NewPayment) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        INSERT INTO payments (
            id, contract_id, payment_date, amount, payment_type, notes,
            next_payment_due_date, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.get())
    .bind(payment.contract_id.get())
    .bind(payment.payment_date)
    .bind(payment.amount.amount().to_string())
    .bind(payment.payment_type_or_default())
    .bind(payment.notes.as_deref())
    .bind(payment.next_payment_due_date)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn delete(conn: &mut SqliteConnection, id: PaymentId) -> Result<(), DatabaseError> {
    let result = sqlx::query("DELETE FROM payments WHERE id = ?")
        .bind(id.get())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Payment", id));
    }
    Ok(())
}

/// Returns the number of payments removed
pub async fn delete_for_contract(conn: &mut SqliteConnection, contract_id: ContractId) -> Result<u64, DatabaseError> {
    let result = sqlx::query("DELETE FROM payments WHERE contract_id = ?")
        .bind(contract_id.get())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}
