//! Sale contracts
//!
//! A contract tracks what a buyer owes for one house. `amount_paid` is a
//! running total: it starts at the down payment and moves with every
//! installment added or removed, and the outstanding balance is always
//! derived from it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{ContractId, HouseId, Money, ReceiptId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::{FieldChecks, Presence, ValidationErrors};

/// Sale type recorded on contracts synthesized from a receipt
pub const FIRST_SALE: &str = "first_sale";

/// Floor count used when the house does not record one
pub const DEFAULT_FLOORS: i32 = 1;

/// Progress of one paperwork step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SignatureStatus {
    #[default]
    Pending,
    Done,
}

impl SignatureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureStatus::Pending => "pending",
            SignatureStatus::Done => "done",
        }
    }
}

impl fmt::Display for SignatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            // Older files store the labels shown on the printed contract
            "pending" | "بالانتظار" => Ok(SignatureStatus::Pending),
            "done" | "تم" => Ok(SignatureStatus::Done),
            other => Err(format!("unknown signature status '{other}'")),
        }
    }
}

/// A stored contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    /// Business key, unique across all contracts
    pub contract_number: i64,
    pub sale_date: NaiveDate,
    pub house_number: i64,
    pub block_number: i64,
    pub area: Decimal,
    pub floors: i32,
    pub buyer_name: String,
    pub mobile_number: String,
    pub sale_type: String,
    pub total_amount: Money,
    pub down_payment: Money,
    pub loan_amount: Money,
    pub amount_paid: Money,
    pub contract_date: NaiveDate,
    pub buyer_signature: SignatureStatus,
    pub investor_signature: SignatureStatus,
    pub contract_receipt: SignatureStatus,
    pub next_payment_due_date: Option<NaiveDate>,
    pub house_id: Option<HouseId>,
    /// Receipt this contract was synthesized from
    pub receipt_id: Option<ReceiptId>,
    pub created_at: DateTime<Utc>,
}

impl Contract {
    /// Outstanding balance, never negative
    pub fn remaining_amount(&self) -> Money {
        remaining_amount(self.total_amount, self.amount_paid)
    }

    pub fn has_open_balance(&self) -> bool {
        self.remaining_amount().is_positive()
    }
}

/// `max(0, total - paid)`
pub fn remaining_amount(total_amount: Money, amount_paid: Money) -> Money {
    total_amount.saturating_sub(amount_paid)
}

/// Outstanding balance of one contract as reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemainingBalance {
    pub contract_id: ContractId,
    pub remaining_amount: Money,
}

/// Input for entering or editing a contract by hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewContract {
    /// Assigned automatically when omitted
    #[serde(default)]
    pub contract_number: Option<i64>,
    pub sale_date: NaiveDate,
    pub house_number: i64,
    pub block_number: i64,
    pub area: Decimal,
    #[validate(range(min = 1, max = 50, message = "must be between 1 and 50"))]
    pub floors: i32,
    #[validate(length(max = 200))]
    pub buyer_name: String,
    #[validate(length(max = 20))]
    pub mobile_number: String,
    #[validate(length(max = 100))]
    pub sale_type: String,
    pub total_amount: Money,
    #[serde(default)]
    pub down_payment: Money,
    #[serde(default)]
    pub loan_amount: Money,
    #[serde(default)]
    pub amount_paid: Money,
    pub contract_date: NaiveDate,
    #[serde(default)]
    pub buyer_signature: SignatureStatus,
    #[serde(default)]
    pub investor_signature: SignatureStatus,
    #[serde(default)]
    pub contract_receipt: SignatureStatus,
    #[serde(default)]
    pub next_payment_due_date: Option<NaiveDate>,
}

impl NewContract {
    /// Checks every field and reports all failures at once
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        let mut checks = FieldChecks::from_derive(self);
        if let Some(number) = self.contract_number {
            checks.require_positive_id("contract_number", number);
        }
        checks
            .require_positive_id("house_number", self.house_number)
            .require_positive_id("block_number", self.block_number)
            .require_non_negative_measure("area", self.area)
            .require_text("buyer_name", &self.buyer_name)
            .require_text("mobile_number", &self.mobile_number)
            .require_text("sale_type", &self.sale_type)
            .require_positive("total_amount", self.total_amount)
            .require_non_negative("down_payment", self.down_payment)
            .require_non_negative("loan_amount", self.loan_amount)
            .require_non_negative("amount_paid", self.amount_paid);
        checks.finish()
    }
}

/// Contract input as submitted, before required keys are checked
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContractDraft {
    pub contract_number: Option<i64>,
    pub sale_date: Option<NaiveDate>,
    pub house_number: Option<i64>,
    pub block_number: Option<i64>,
    pub area: Option<Decimal>,
    pub floors: Option<i32>,
    pub buyer_name: Option<String>,
    pub mobile_number: Option<String>,
    pub sale_type: Option<String>,
    pub total_amount: Option<Money>,
    pub down_payment: Option<Money>,
    pub loan_amount: Option<Money>,
    pub amount_paid: Option<Money>,
    pub contract_date: Option<NaiveDate>,
    pub buyer_signature: Option<SignatureStatus>,
    pub investor_signature: Option<SignatureStatus>,
    pub contract_receipt: Option<SignatureStatus>,
    pub next_payment_due_date: Option<NaiveDate>,
}

impl ContractDraft {
    /// Completes the draft, reporting absent keys with every other failure
    pub fn into_input(self) -> Result<NewContract, ValidationErrors> {
        let mut presence = Presence::default();
        let input = NewContract {
            contract_number: self.contract_number,
            sale_date: presence.take_or("sale_date", self.sale_date, NaiveDate::MIN),
            house_number: presence.take("house_number", self.house_number),
            block_number: presence.take("block_number", self.block_number),
            area: presence.take("area", self.area),
            floors: presence.take("floors", self.floors),
            buyer_name: presence.take("buyer_name", self.buyer_name),
            mobile_number: presence.take("mobile_number", self.mobile_number),
            sale_type: presence.take("sale_type", self.sale_type),
            total_amount: presence.take("total_amount", self.total_amount),
            down_payment: self.down_payment.unwrap_or_default(),
            loan_amount: self.loan_amount.unwrap_or_default(),
            amount_paid: self.amount_paid.unwrap_or_default(),
            contract_date: presence.take_or("contract_date", self.contract_date, NaiveDate::MIN),
            buyer_signature: self.buyer_signature.unwrap_or_default(),
            investor_signature: self.investor_signature.unwrap_or_default(),
            contract_receipt: self.contract_receipt.unwrap_or_default(),
            next_payment_due_date: self.next_payment_due_date,
        };
        presence.conclude(input, NewContract::validate_all)
    }
}

/// Links resolved by the engine rather than supplied by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContractLinks {
    pub house_id: Option<HouseId>,
    pub receipt_id: Option<ReceiptId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_is_floored_at_zero() {
        let total = Money::from_units(100_000);
        assert_eq!(
            remaining_amount(total, Money::from_units(40_000)),
            Money::from_units(60_000)
        );
        assert_eq!(remaining_amount(total, Money::from_units(120_000)), Money::zero());
    }

    #[test]
    fn test_signature_status_serde() {
        let json = serde_json::to_string(&SignatureStatus::Done).unwrap();
        assert_eq!(json, "\"done\"");
        assert_eq!("pending".parse::<SignatureStatus>().unwrap(), SignatureStatus::Pending);
        assert!("signed".parse::<SignatureStatus>().is_err());
    }

    #[test]
    fn test_draft_defaults_optional_amounts() {
        let draft: ContractDraft = serde_json::from_value(serde_json::json!({
            "sale_date": "2024-01-01",
            "house_number": 4,
            "block_number": 1,
            "area": "180",
            "floors": 2,
            "buyer_name": "Huda Kareem",
            "mobile_number": "07809998877",
            "sale_type": "first_sale",
            "total_amount": "90000",
            "contract_date": "2024-01-01"
        }))
        .unwrap();

        let input = draft.into_input().unwrap();
        assert_eq!(input.contract_number, None);
        assert!(input.amount_paid.is_zero());
        assert_eq!(input.buyer_signature, SignatureStatus::Pending);
    }

    #[test]
    fn test_empty_draft_lists_every_required_key() {
        let errors = ContractDraft::default().into_input().unwrap_err();
        for field in [
            "area",
            "block_number",
            "buyer_name",
            "contract_date",
            "floors",
            "house_number",
            "mobile_number",
            "sale_date",
            "sale_type",
            "total_amount",
        ] {
            assert!(errors.has_field(field), "{field} not reported");
        }
        assert!(errors.fields().iter().all(|e| e.message == "is required"));
    }
}
