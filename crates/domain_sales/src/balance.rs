//! Balance Engine
//!
//! Maintains `Contract.amount_paid` as payments come and go. The stored
//! total is adjusted by the payment amount on every add and delete, so
//! adding a payment and deleting it again restores the previous value
//! exactly. Removal is floored at zero.

use core_kernel::{ContractId, Money, PaymentId};
use tracing::{debug, info};

use crate::contract::Contract;
use crate::error::SalesError;
use crate::payment::{NewPayment, Payment};
use crate::ports::RecordTx;

/// `amount_paid` after a payment is recorded
pub fn apply_payment(amount_paid: Money, amount: Money) -> Money {
    amount_paid + amount
}

/// `amount_paid` after a payment is removed, never below zero
pub fn revert_payment(amount_paid: Money, amount: Money) -> Money {
    amount_paid.saturating_sub(amount)
}

/// Sum of outstanding balances
pub fn total_debts<'a>(contracts: impl IntoIterator<Item = &'a Contract>) -> Money {
    contracts.into_iter().map(Contract::remaining_amount).sum()
}

/// Outstanding balance of a stored contract
pub async fn remaining_amount(tx: &mut dyn RecordTx, contract_id: ContractId) -> Result<Money, SalesError> {
    let contract = tx
        .contract(contract_id)
        .await?
        .ok_or_else(|| SalesError::not_found("Contract", contract_id))?;
    Ok(contract.remaining_amount())
}

/// Records a payment and raises the contract's paid total
pub async fn add_payment(tx: &mut dyn RecordTx, mut input: NewPayment) -> Result<Payment, SalesError> {
    input.validate_all()?;

    let contract = tx
        .contract(input.contract_id)
        .await?
        .ok_or_else(|| SalesError::not_found("Contract", input.contract_id))?;

    input.payment_type = Some(input.payment_type_or_default());
    let payment = tx.insert_payment(&input).await?;

    let amount_paid = apply_payment(contract.amount_paid, payment.amount);
    tx.set_amount_paid(contract.id, amount_paid).await?;

    info!(
        payment_id = %payment.id,
        contract_id = %contract.id,
        amount = %payment.amount,
        amount_paid = %amount_paid,
        "Payment recorded"
    );
    Ok(payment)
}

/// Deletes a payment and lowers the contract's paid total
///
/// A payment whose contract has already gone is still deleted.
pub async fn delete_payment(tx: &mut dyn RecordTx, payment_id: PaymentId) -> Result<Payment, SalesError> {
    let payment = tx
        .payment(payment_id)
        .await?
        .ok_or_else(|| SalesError::not_found("Payment", payment_id))?;

    tx.delete_payment(payment_id).await?;

    match tx.contract(payment.contract_id).await? {
        Some(contract) => {
            let amount_paid = revert_payment(contract.amount_paid, payment.amount);
            tx.set_amount_paid(contract.id, amount_paid).await?;
            info!(
                payment_id = %payment_id,
                contract_id = %contract.id,
                amount_paid = %amount_paid,
                "Payment deleted"
            );
        }
        None => {
            debug!(payment_id = %payment_id, contract_id = %payment.contract_id, "Deleted payment of a missing contract");
        }
    }

    Ok(payment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revert_floors_at_zero() {
        assert_eq!(
            revert_payment(Money::from_units(1_000), Money::from_units(5_000)),
            Money::zero()
        );
    }

    #[test]
    fn test_apply_then_revert() {
        let before = Money::from_units(50_000);
        let after = apply_payment(before, Money::from_units(12_500));
        assert_eq!(after, Money::from_units(62_500));
        assert_eq!(revert_payment(after, Money::from_units(12_500)), before);
    }

    #[test]
    fn test_total_debts_of_nothing_is_zero() {
        let none: Vec<Contract> = Vec::new();
        assert_eq!(total_debts(&none), Money::zero());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn add_then_delete_restores_paid_total(
            paid in 0i64..10_000_000i64,
            amount in 1i64..10_000_000i64
        ) {
            let before = Money::from_units(paid);
            let after = revert_payment(apply_payment(before, Money::from_units(amount)), Money::from_units(amount));
            prop_assert_eq!(after, before);
        }

        #[test]
        fn paid_total_never_negative(
            paid in 0i64..10_000_000i64,
            removals in proptest::collection::vec(1i64..5_000_000i64, 0..10)
        ) {
            let mut current = Money::from_units(paid);
            for amount in removals {
                current = revert_payment(current, Money::from_units(amount));
                prop_assert!(!current.is_negative());
            }
        }
    }
}
