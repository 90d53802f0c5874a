//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for ledger types that give more
//! meaningful failure messages than standard assertions.

use core_kernel::Money;
use domain_sales::contract::Contract;
use domain_sales::error::SalesError;
use domain_sales::house::HouseStatus;
use domain_sales::ports::SalesPort;
use core_kernel::HouseId;

/// Asserts that a money value equals `expected`
pub fn assert_money_eq(actual: Money, expected: Money) {
    assert_eq!(
        actual.amount(),
        expected.amount(),
        "Money mismatch: actual={actual}, expected={expected}"
    );
}

/// Asserts that a result failed validation on `field`
///
/// # Panics
///
/// Panics if the result is Ok, fails with another error kind, or does not
/// name the field.
pub fn assert_validation_error_on<T: std::fmt::Debug>(result: Result<T, SalesError>, field: &str) {
    match result {
        Err(SalesError::Validation(errors)) => assert!(
            errors.has_field(field),
            "Expected a validation error on '{field}', got {errors:?}"
        ),
        other => panic!("Expected a validation error on '{field}', got {other:?}"),
    }
}

/// Asserts that a result failed because a record is missing
pub fn assert_not_found<T: std::fmt::Debug>(result: Result<T, SalesError>) {
    match result {
        Err(e) if e.is_not_found() => {}
        other => panic!("Expected a not found error, got {other:?}"),
    }
}

/// Asserts that the stored paid total and the remaining balance agree
pub fn assert_balance(contract: &Contract, paid: Money, remaining: Money) {
    assert_money_eq(contract.amount_paid, paid);
    assert_money_eq(contract.remaining_amount(), remaining);
}

/// Asserts the stored status of a house
///
/// # Panics
///
/// Panics if the house cannot be read.
pub async fn assert_house_status(port: &dyn SalesPort, house_id: HouseId, expected: HouseStatus) {
    let house = port
        .get_house(house_id)
        .await
        .unwrap_or_else(|e| panic!("house {house_id} unreadable: {e}"));
    assert_eq!(
        house.status, expected,
        "House {} has status {}, expected {}",
        house.house_number, house.status, expected
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_eq_ignores_scale() {
        assert_money_eq(Money::new(dec!(10.50)), Money::new(dec!(10.5)));
    }

    #[test]
    fn test_validation_error_on_field() {
        let result: Result<(), SalesError> = Err(SalesError::invalid("amount", "must be positive"));
        assert_validation_error_on(result, "amount");
    }

    #[test]
    #[should_panic(expected = "Expected a not found error")]
    fn test_not_found_rejects_ok() {
        assert_not_found::<()>(Ok(()));
    }
}
