//! Row types and their conversion into domain records
//!
//! Money and area columns are selected through `CAST(... AS TEXT)` so that
//! values written as REAL by older releases read back the same way as the
//! decimal strings written now.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{ContractId, HouseId, Money, PaymentId, ReceiptId, ResaleId};
use domain_sales::contract::{Contract, SignatureStatus};
use domain_sales::house::{House, HouseStatus};
use domain_sales::payment::{Payment, DEFAULT_PAYMENT_TYPE};
use domain_sales::receipt::Receipt;
use domain_sales::resale::ResaleListing;
use rust_decimal::Decimal;
use sqlx::FromRow;

use crate::error::DatabaseError;

pub(crate) const HOUSE_COLUMNS: &str = "id, house_number, block_number, \
    CAST(total_area AS TEXT) AS total_area, CAST(building_area AS TEXT) AS building_area, \
    CAST(total_price AS TEXT) AS total_price, CAST(down_payment AS TEXT) AS down_payment, \
    CAST(loan_amount AS TEXT) AS loan_amount, phase, CAST(outlook AS TEXT) AS outlook, \
    floors, building_material, additional_specs, status, created_at";

pub(crate) const RECEIPT_COLUMNS: &str = "id, receipt_number, receipt_date, buyer_name, mobile_number, \
    unit_number, block_number, CAST(unit_area AS TEXT) AS unit_area, \
    CAST(amount_received AS TEXT) AS amount_received, CAST(remaining_amount AS TEXT) AS remaining_amount, \
    due_date, notes, house_id, contract_id, created_at";

pub(crate) const CONTRACT_COLUMNS: &str = "id, contract_number, sale_date, house_number, block_number, \
    CAST(area AS TEXT) AS area, floors, buyer_name, mobile_number, sale_type, \
    CAST(total_amount AS TEXT) AS total_amount, CAST(down_payment AS TEXT) AS down_payment, \
    CAST(loan_amount AS TEXT) AS loan_amount, CAST(amount_paid AS TEXT) AS amount_paid, \
    contract_date, buyer_signature, investor_signature, contract_receipt, next_payment_due_date, \
    house_id, receipt_id, created_at";

pub(crate) const PAYMENT_COLUMNS: &str = "id, contract_id, payment_date, CAST(amount AS TEXT) AS amount, \
    payment_type, notes, next_payment_due_date, created_at";

pub(crate) const RESALE_COLUMNS: &str = "id, house_id, source, mobile_number, contact_date, \
    CAST(remaining_amount AS TEXT) AS remaining_amount, floors, building_material, additional_specs, created_at";

fn money(table: &'static str, column: &'static str, raw: &str) -> Result<Money, DatabaseError> {
    measure(table, column, raw).map(Money::from)
}

/// Missing or blank amounts read as zero
fn money_or_zero(table: &'static str, column: &'static str, raw: Option<&str>) -> Result<Money, DatabaseError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Money::zero()),
        Some(value) => money(table, column, value),
    }
}

fn measure(table: &'static str, column: &'static str, raw: &str) -> Result<Decimal, DatabaseError> {
    Decimal::from_str(raw.trim())
        .or_else(|_| Decimal::from_scientific(raw.trim()))
        .map_err(|e| DatabaseError::corrupt(table, column, e.to_string()))
}

fn signature(column: &'static str, raw: Option<String>) -> Result<SignatureStatus, DatabaseError> {
    match raw {
        None => Ok(SignatureStatus::Pending),
        Some(value) => SignatureStatus::from_str(value.trim())
            .map_err(|e| DatabaseError::corrupt("contracts", column, e)),
    }
}

fn created(raw: Option<DateTime<Utc>>) -> DateTime<Utc> {
    raw.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

#[derive(Debug, FromRow)]
pub(crate) struct HouseRow {
    id: i64,
    house_number: i64,
    block_number: i64,
    total_area: String,
    building_area: String,
    total_price: String,
    down_payment: Option<String>,
    loan_amount: Option<String>,
    phase: i64,
    outlook: Option<String>,
    floors: Option<i32>,
    building_material: Option<String>,
    additional_specs: Option<String>,
    status: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<HouseRow> for House {
    type Error = DatabaseError;

    fn try_from(row: HouseRow) -> Result<Self, Self::Error> {
        let status = match row.status.as_deref().map(str::trim) {
            None | Some("") => HouseStatus::Available,
            Some(s) => HouseStatus::from_str(s).map_err(|e| DatabaseError::corrupt("houses", "status", e))?,
        };
        let phase = u8::try_from(row.phase)
            .map_err(|_| DatabaseError::corrupt("houses", "phase", format!("{} is out of range", row.phase)))?;

        Ok(House {
            id: HouseId::new(row.id),
            house_number: row.house_number,
            block_number: row.block_number,
            total_area: measure("houses", "total_area", &row.total_area)?,
            building_area: measure("houses", "building_area", &row.building_area)?,
            total_price: money("houses", "total_price", &row.total_price)?,
            down_payment: money_or_zero("houses", "down_payment", row.down_payment.as_deref())?,
            loan_amount: money_or_zero("houses", "loan_amount", row.loan_amount.as_deref())?,
            phase,
            // Older releases kept free text here; only numbers count
            outlook: row.outlook.as_deref().and_then(|s| Money::from_str(s.trim()).ok()),
            floors: row.floors,
            building_material: row.building_material,
            additional_specs: row.additional_specs,
            status,
            created_at: created(row.created_at),
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ReceiptRow {
    id: i64,
    receipt_number: i64,
    receipt_date: NaiveDate,
    buyer_name: String,
    mobile_number: String,
    unit_number: i64,
    block_number: i64,
    unit_area: String,
    amount_received: String,
    remaining_amount: String,
    due_date: Option<NaiveDate>,
    notes: Option<String>,
    house_id: Option<i64>,
    contract_id: Option<i64>,
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<ReceiptRow> for Receipt {
    type Error = DatabaseError;

    fn try_from(row: ReceiptRow) -> Result<Self, Self::Error> {
        Ok(Receipt {
            id: ReceiptId::new(row.id),
            receipt_number: row.receipt_number,
            receipt_date: row.receipt_date,
            buyer_name: row.buyer_name,
            mobile_number: row.mobile_number,
            unit_number: row.unit_number,
            block_number: row.block_number,
            unit_area: measure("receipts", "unit_area", &row.unit_area)?,
            amount_received: money("receipts", "amount_received", &row.amount_received)?,
            remaining_amount: money("receipts", "remaining_amount", &row.remaining_amount)?,
            due_date: row.due_date,
            notes: row.notes,
            house_id: row.house_id.map(HouseId::new),
            contract_id: row.contract_id.map(ContractId::new),
            created_at: created(row.created_at),
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ContractRow {
    id: i64,
    contract_number: i64,
    sale_date: NaiveDate,
    house_number: i64,
    block_number: i64,
    area: String,
    floors: i32,
    buyer_name: String,
    mobile_number: String,
    sale_type: String,
    total_amount: String,
    down_payment: String,
    loan_amount: String,
    amount_paid: String,
    contract_date: NaiveDate,
    buyer_signature: Option<String>,
    investor_signature: Option<String>,
    contract_receipt: Option<String>,
    next_payment_due_date: Option<NaiveDate>,
    house_id: Option<i64>,
    receipt_id: Option<i64>,
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<ContractRow> for Contract {
    type Error = DatabaseError;

    fn try_from(row: ContractRow) -> Result<Self, Self::Error> {
        Ok(Contract {
            id: ContractId::new(row.id),
            contract_number: row.contract_number,
            sale_date: row.sale_date,
            house_number: row.house_number,
            block_number: row.block_number,
            area: measure("contracts", "area", &row.area)?,
            floors: row.floors,
            buyer_name: row.buyer_name,
            mobile_number: row.mobile_number,
            sale_type: row.sale_type,
            total_amount: money("contracts", "total_amount", &row.total_amount)?,
            down_payment: money("contracts", "down_payment", &row.down_payment)?,
            loan_amount: money("contracts", "loan_amount", &row.loan_amount)?,
            amount_paid: money("contracts", "amount_paid", &row.amount_paid)?,
            contract_date: row.contract_date,
            buyer_signature: signature("buyer_signature", row.buyer_signature)?,
            investor_signature: signature("investor_signature", row.investor_signature)?,
            contract_receipt: signature("contract_receipt", row.contract_receipt)?,
            next_payment_due_date: row.next_payment_due_date,
            house_id: row.house_id.map(HouseId::new),
            receipt_id: row.receipt_id.map(ReceiptId::new),
            created_at: created(row.created_at),
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct PaymentRow {
    id: i64,
    contract_id: i64,
    payment_date: NaiveDate,
    amount: String,
    payment_type: Option<String>,
    notes: Option<String>,
    next_payment_due_date: Option<NaiveDate>,
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DatabaseError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: PaymentId::new(row.id),
            contract_id: ContractId::new(row.contract_id),
            payment_date: row.payment_date,
            amount: money("payments", "amount", &row.amount)?,
            payment_type: row
                .payment_type
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PAYMENT_TYPE.to_string()),
            notes: row.notes,
            next_payment_due_date: row.next_payment_due_date,
            created_at: created(row.created_at),
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ResaleRow {
    id: i64,
    house_id: i64,
    source: String,
    mobile_number: String,
    contact_date: NaiveDate,
    remaining_amount: Option<String>,
    floors: Option<i32>,
    building_material: Option<String>,
    additional_specs: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<ResaleRow> for ResaleListing {
    type Error = DatabaseError;

    fn try_from(row: ResaleRow) -> Result<Self, Self::Error> {
        let remaining_amount = match row.remaining_amount.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(money("resale", "remaining_amount", raw)?),
        };
        Ok(ResaleListing {
            id: ResaleId::new(row.id),
            house_id: HouseId::new(row.house_id),
            source: row.source,
            mobile_number: row.mobile_number,
            contact_date: row.contact_date,
            remaining_amount,
            floors: row.floors,
            building_material: row.building_material,
            additional_specs: row.additional_specs,
            created_at: created(row.created_at),
        })
    }
}

/// Converts a batch of rows, failing on the first corrupt one
pub(crate) fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, DatabaseError>
where
    T: TryFrom<R, Error = DatabaseError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_legacy_real_values_parse() {
        assert_eq!(money("houses", "total_price", "150000.0").unwrap(), Money::from_units(150_000));
        assert_eq!(measure("houses", "total_area", "250.5").unwrap(), dec!(250.5));
    }

    #[test]
    fn test_blank_amount_is_zero() {
        assert_eq!(money_or_zero("houses", "loan_amount", Some(" ")).unwrap(), Money::zero());
        assert_eq!(money_or_zero("houses", "loan_amount", None).unwrap(), Money::zero());
    }

    #[test]
    fn test_garbage_amount_is_corrupt() {
        let err = money("contracts", "amount_paid", "abc").unwrap_err();
        assert!(err.to_string().starts_with("Corrupt value in contracts.amount_paid"));
    }

    #[test]
    fn test_legacy_signature_labels() {
        assert_eq!(signature("buyer_signature", Some("تم".to_string())).unwrap(), SignatureStatus::Done);
        assert_eq!(signature("buyer_signature", None).unwrap(), SignatureStatus::Pending);
    }
}
