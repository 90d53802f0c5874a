//! Installment payments against a contract

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{ContractId, Money, PaymentId};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::{FieldChecks, Presence, ValidationErrors};

/// Category recorded when the caller does not supply one
pub const DEFAULT_PAYMENT_TYPE: &str = "installment";

/// A stored payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub contract_id: ContractId,
    pub payment_date: NaiveDate,
    pub amount: Money,
    pub payment_type: String,
    pub notes: Option<String>,
    /// Due date agreed at the counter, overriding the fixed term when the
    /// due-date policy honours it
    pub next_payment_due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Input for recording a payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewPayment {
    pub contract_id: ContractId,
    pub payment_date: NaiveDate,
    pub amount: Money,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub payment_type: Option<String>,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[serde(default)]
    pub next_payment_due_date: Option<NaiveDate>,
}

impl NewPayment {
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        let mut checks = FieldChecks::from_derive(self);
        checks.require_positive("amount", self.amount);
        checks.finish()
    }

    /// Payment type with blanks replaced by the default category
    pub fn payment_type_or_default(&self) -> String {
        self.payment_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_PAYMENT_TYPE)
            .to_string()
    }
}

/// Payment input as submitted, before required keys are checked
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaymentDraft {
    pub contract_id: Option<ContractId>,
    pub payment_date: Option<NaiveDate>,
    pub amount: Option<Money>,
    pub payment_type: Option<String>,
    pub notes: Option<String>,
    pub next_payment_due_date: Option<NaiveDate>,
}

impl PaymentDraft {
    /// Completes the draft, reporting absent keys with every other failure
    pub fn into_input(self) -> Result<NewPayment, ValidationErrors> {
        let mut presence = Presence::default();
        let input = NewPayment {
            contract_id: presence.take_or("contract_id", self.contract_id, ContractId::new(0)),
            payment_date: presence.take_or("payment_date", self.payment_date, NaiveDate::MIN),
            amount: presence.take("amount", self.amount),
            payment_type: self.payment_type,
            notes: self.notes,
            next_payment_due_date: self.next_payment_due_date,
        };
        presence.conclude(input, NewPayment::validate_all)
    }
}

/// Orders payments newest first: payment date, then entry time, then id
pub fn sort_newest_first(payments: &mut [Payment]) {
    payments.sort_by(|a, b| {
        b.payment_date
            .cmp(&a.payment_date)
            .then(b.created_at.cmp(&a.created_at))
            .then(b.id.cmp(&a.id))
    });
}

/// The most recent payment of a slice, by the same ordering as [`sort_newest_first`]
pub fn latest(payments: &[Payment]) -> Option<&Payment> {
    payments
        .iter()
        .max_by(|a, b| {
            a.payment_date
                .cmp(&b.payment_date)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn payment(id: i64, date: (i32, u32, u32), entered_at_hour: u32) -> Payment {
        Payment {
            id: PaymentId::new(id),
            contract_id: ContractId::new(1),
            payment_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            amount: Money::from_units(1_000),
            payment_type: DEFAULT_PAYMENT_TYPE.into(),
            notes: None,
            next_payment_due_date: None,
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, entered_at_hour, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_blank_payment_type_defaults() {
        let input = NewPayment {
            contract_id: ContractId::new(1),
            payment_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            amount: Money::from_units(5_000),
            payment_type: Some("   ".into()),
            notes: None,
            next_payment_due_date: None,
        };
        assert_eq!(input.payment_type_or_default(), "installment");
    }

    #[test]
    fn test_zero_amount_rejected() {
        let input = NewPayment {
            contract_id: ContractId::new(1),
            payment_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            amount: Money::zero(),
            payment_type: None,
            notes: None,
            next_payment_due_date: None,
        };
        assert!(input.validate_all().unwrap_err().has_field("amount"));
    }

    #[test]
    fn test_latest_breaks_date_ties_by_entry_time() {
        let payments = vec![
            payment(1, (2024, 3, 1), 9),
            payment(2, (2024, 3, 1), 15),
            payment(3, (2024, 2, 1), 23),
        ];
        assert_eq!(latest(&payments).map(|p| p.id), Some(PaymentId::new(2)));

        let mut sorted = payments.clone();
        sort_newest_first(&mut sorted);
        let ids: Vec<i64> = sorted.iter().map(|p| p.id.get()).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_draft_without_contract_or_amount() {
        let draft: PaymentDraft = serde_json::from_value(serde_json::json!({
            "payment_date": "2024-02-01",
            "amount": null
        }))
        .unwrap();
        let errors = draft.into_input().unwrap_err();
        assert_eq!(errors.to_string(), "amount: is required, contract_id: is required");
    }
}
