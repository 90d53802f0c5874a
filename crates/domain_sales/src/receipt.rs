//! Down-payment receipts

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{ContractId, HouseId, Money, ReceiptId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::contract::Contract;
use crate::validation::{FieldChecks, Presence, ValidationErrors};

/// A stored receipt
///
/// The unit identity (`unit_number`, `block_number`, `unit_area`) is copied
/// from the house at the time of issue and is not kept in sync afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: ReceiptId,
    /// Business key, unique across all receipts
    pub receipt_number: i64,
    pub receipt_date: NaiveDate,
    pub buyer_name: String,
    pub mobile_number: String,
    pub unit_number: i64,
    pub block_number: i64,
    pub unit_area: Decimal,
    pub amount_received: Money,
    /// Balance declared on the receipt; not reconciled with the contract
    pub remaining_amount: Money,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub house_id: Option<HouseId>,
    /// Contract synthesized when this receipt was issued
    pub contract_id: Option<ContractId>,
    pub created_at: DateTime<Utc>,
}

/// Input for issuing a receipt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewReceipt {
    pub receipt_number: i64,
    pub receipt_date: NaiveDate,
    #[validate(length(max = 200))]
    pub buyer_name: String,
    #[validate(length(max = 20))]
    pub mobile_number: String,
    pub unit_number: i64,
    pub block_number: i64,
    pub unit_area: Decimal,
    pub amount_received: Money,
    pub remaining_amount: Money,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[serde(default)]
    pub house_id: Option<HouseId>,
}

impl NewReceipt {
    /// Checks every field and reports all failures at once
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        let mut checks = FieldChecks::from_derive(self);
        checks
            .require_positive_id("receipt_number", self.receipt_number)
            .require_text("buyer_name", &self.buyer_name)
            .require_text("mobile_number", &self.mobile_number)
            .require_positive_id("unit_number", self.unit_number)
            .require_positive_id("block_number", self.block_number)
            .require_non_negative_measure("unit_area", self.unit_area)
            .require_positive("amount_received", self.amount_received)
            .require_non_negative("remaining_amount", self.remaining_amount);
        checks.finish()
    }
}

/// Receipt input as submitted, before required keys are checked
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReceiptDraft {
    pub receipt_number: Option<i64>,
    pub receipt_date: Option<NaiveDate>,
    pub buyer_name: Option<String>,
    pub mobile_number: Option<String>,
    pub unit_number: Option<i64>,
    pub block_number: Option<i64>,
    pub unit_area: Option<Decimal>,
    pub amount_received: Option<Money>,
    pub remaining_amount: Option<Money>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub house_id: Option<HouseId>,
}

impl ReceiptDraft {
    /// Completes the draft, reporting absent keys with every other failure
    pub fn into_input(self) -> Result<NewReceipt, ValidationErrors> {
        let mut presence = Presence::default();
        let input = NewReceipt {
            receipt_number: presence.take("receipt_number", self.receipt_number),
            receipt_date: presence.take_or("receipt_date", self.receipt_date, NaiveDate::MIN),
            buyer_name: presence.take("buyer_name", self.buyer_name),
            mobile_number: presence.take("mobile_number", self.mobile_number),
            unit_number: presence.take("unit_number", self.unit_number),
            block_number: presence.take("block_number", self.block_number),
            unit_area: presence.take("unit_area", self.unit_area),
            amount_received: presence.take("amount_received", self.amount_received),
            remaining_amount: presence.take("remaining_amount", self.remaining_amount),
            due_date: self.due_date,
            notes: self.notes,
            house_id: self.house_id,
        };
        presence.conclude(input, NewReceipt::validate_all)
    }
}

/// Result of issuing a receipt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptIssued {
    pub receipt: Receipt,
    pub contract: Contract,
}

/// Result of deleting a receipt and its paired contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptRemoval {
    pub receipt_id: ReceiptId,
    /// Contract removed with the receipt, if one was found
    pub contract_id: Option<ContractId>,
    pub payments_removed: u64,
    /// House returned to `available` because nothing references it anymore
    pub house_released: Option<HouseId>,
}
