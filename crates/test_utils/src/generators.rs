//! Property-Based Test Generators
//!
//! Provides proptest strategies for ledger values that respect the input
//! rules: positive amounts, dates in a plausible range and non-empty
//! payment histories.

use chrono::{Duration, NaiveDate};
use core_kernel::{ContractId, Money};
use domain_sales::payment::NewPayment;
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::fixtures::date;

/// Strategy for positive amounts with up to two decimal places
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    (1i64..100_000_000i64).prop_map(|cents| Money::new(Decimal::new(cents, 2)))
}

/// Strategy for dates between 2020 and the end of 2026
pub fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..2557i64).prop_map(|offset| date(2020, 1, 1) + Duration::days(offset))
}

/// Strategy for a payment against `contract_id`
pub fn payment_strategy(contract_id: ContractId) -> impl Strategy<Value = NewPayment> {
    (date_strategy(), positive_money_strategy()).prop_map(move |(payment_date, amount)| NewPayment {
        contract_id,
        payment_date,
        amount,
        payment_type: None,
        notes: None,
        next_payment_due_date: None,
    })
}

/// Strategy for a history of one to `max` payments
pub fn payment_history_strategy(contract_id: ContractId, max: usize) -> impl Strategy<Value = Vec<NewPayment>> {
    proptest::collection::vec(payment_strategy(contract_id), 1..=max.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn positive_money_is_positive(m in positive_money_strategy()) {
            prop_assert!(m.is_positive());
        }

        #[test]
        fn generated_payments_validate(p in payment_strategy(ContractId::new(1))) {
            prop_assert!(p.validate_all().is_ok());
        }
    }
}
