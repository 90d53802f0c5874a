//! Contract queries

use chrono::Utc;
use core_kernel::{ContractId, HouseId, Money};
use domain_sales::contract::{Contract, ContractLinks, NewContract};
use sqlx::SqliteConnection;

use super::rows::{convert_all, ContractRow, CONTRACT_COLUMNS};
use crate::error::DatabaseError;

/// All contracts, most recent sale first
pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Contract>, DatabaseError> {
    let rows: Vec<ContractRow> = sqlx::query_as(&format!(
        "SELECT {CONTRACT_COLUMNS} FROM contracts ORDER BY sale_date DESC, id DESC"
    ))
    .fetch_all(&mut *conn)
    .await?;
    convert_all(rows)
}

pub async fn list_for_house(conn: &mut SqliteConnection, house_id: HouseId) -> Result<Vec<Contract>, DatabaseError> {
    let rows: Vec<ContractRow> = sqlx::query_as(&format!(
        "SELECT {CONTRACT_COLUMNS} FROM contracts WHERE house_id = ? ORDER BY contract_date DESC, id DESC"
    ))
    .bind(house_id.get())
    .fetch_all(&mut *conn)
    .await?;
    convert_all(rows)
}

pub async fn find(conn: &mut SqliteConnection, id: ContractId) -> Result<Option<Contract>, DatabaseError> {
    let row: Option<ContractRow> = sqlx::query_as(&format!("SELECT {CONTRACT_COLUMNS} FROM contracts WHERE id = ?"))
        .bind(id.get())
        .fetch_optional(&mut *conn)
        .await?;
    row.map(Contract::try_from).transpose()
}

pub async fn find_by_number(conn: &mut SqliteConnection, contract_number: i64) -> Result<Option<Contract>, DatabaseError> {
    let row: Option<ContractRow> =
        sqlx::query_as(&format!("SELECT {CONTRACT_COLUMNS} FROM contracts WHERE contract_number = ?"))
            .bind(contract_number)
            .fetch_optional(&mut *conn)
            .await?;
    row.map(Contract::try_from).transpose()
}

pub async fn next_number(conn: &mut SqliteConnection) -> Result<i64, DatabaseError> {
    let next: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(contract_number), 0) + 1 FROM contracts")
        .fetch_one(&mut *conn)
        .await?;
    Ok(next)
}

fn assigned_number(contract: &NewContract) -> Result<i64, DatabaseError> {
    contract
        .contract_number
        .ok_or_else(|| DatabaseError::ConstraintViolation("contract_number must be assigned".to_string()))
}

pub async fn insert(
    conn: &mut SqliteConnection,
    id: ContractId,
    contract: &NewContract,
    links: ContractLinks,
) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        INSERT INTO contracts (
            id, contract_number, sale_date, house_number, block_number, area, floors,
            buyer_name, mobile_number, sale_type, total_amount, down_payment, loan_amount,
            amount_paid, contract_date, buyer_signature, investor_signature, contract_receipt,
            next_payment_due_date, house_id, receipt_id, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.get())
    .bind(assigned_number(contract)?)
    .bind(contract.sale_date)
    .bind(contract.house_number)
    .bind(contract.block_number)
    .bind(contract.area.to_string())
    .bind(contract.floors)
    .bind(contract.buyer_name.trim())
    .bind(contract.mobile_number.trim())
    .bind(contract.sale_type.trim())
    .bind(contract.total_amount.amount().to_string())
    .bind(contract.down_payment.amount().to_string())
    .bind(contract.loan_amount.amount().to_string())
    .bind(contract.amount_paid.amount().to_string())
    .bind(contract.contract_date)
    .bind(contract.buyer_signature.as_str())
    .bind(contract.investor_signature.as_str())
    .bind(contract.contract_receipt.as_str())
    .bind(contract.next_payment_due_date)
    .bind(links.house_id.map(|h| h.get()))
    .bind(links.receipt_id.map(|r| r.get()))
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn update(
    conn: &mut SqliteConnection,
    id: ContractId,
    contract: &NewContract,
    links: ContractLinks,
) -> Result<(), DatabaseError> {
    let result = sqlx::query(
        r#"
        UPDATE contracts SET
            contract_number = ?, sale_date = ?, house_number = ?, block_number = ?, area = ?,
            floors = ?, buyer_name = ?, mobile_number = ?, sale_type = ?, total_amount = ?,
            down_payment = ?, loan_amount = ?, amount_paid = ?, contract_date = ?,
            buyer_signature = ?, investor_signature = ?, contract_receipt = ?,
            next_payment_due_date = ?, house_id = ?, receipt_id = ?
        WHERE id = ?
        "#,
    )
    .bind(assigned_number(contract)?)
    .bind(contract.sale_date)
    .bind(contract.house_number)
    .bind(contract.block_number)
    .bind(contract.area.to_string())
    .bind(contract.floors)
    .bind(contract.buyer_name.trim())
    .bind(contract.mobile_number.trim())
    .bind(contract.sale_type.trim())
    .bind(contract.total_amount.amount().to_string())
    .bind(contract.down_payment.amount().to_string())
    .bind(contract.loan_amount.amount().to_string())
    .bind(contract.amount_paid.amount().to_string())
    .bind(contract.contract_date)
    .bind(contract.buyer_signature.as_str())
    .bind(contract.investor_signature.as_str())
    .bind(contract.contract_receipt.as_str())
    .bind(contract.next_payment_due_date)
    .bind(links.house_id.map(|h| h.get()))
    .bind(links.receipt_id.map(|r| r.get()))
    .bind(id.get())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Contract", id));
    }
    Ok(())
}

pub async fn set_amount_paid(conn: &mut SqliteConnection, id: ContractId, amount_paid: Money) -> Result<(), DatabaseError> {
    let result = sqlx::query("UPDATE contracts SET amount_paid = ? WHERE id = ?")
        .bind(amount_paid.amount().to_string())
        .bind(id.get())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Contract", id));
    }
    Ok(())
}

pub async fn delete(conn: &mut SqliteConnection, id: ContractId) -> Result<(), DatabaseError> {
    let result = sqlx::query("DELETE FROM contracts WHERE id = ?")
        .bind(id.get())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Contract", id));
    }
    Ok(())
}
