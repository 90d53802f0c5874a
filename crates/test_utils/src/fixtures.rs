//! Pre-built Test Fixtures
//!
//! Provides ready-to-use values for the common records of the ledger.
//! These fixtures are consistent and predictable so that tests can assert
//! exact figures.

use chrono::NaiveDate;
use core_kernel::Money;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Fixture for money values
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Price of the standard test house
    pub fn house_price() -> Money {
        Money::new(dec!(150000))
    }

    /// Down payment of the standard test house
    pub fn down_payment() -> Money {
        Money::new(dec!(30000))
    }

    /// Loan of the standard test house
    pub fn loan() -> Money {
        Money::new(dec!(120000))
    }

    /// Amount received on the standard test receipt
    pub fn received() -> Money {
        Money::new(dec!(30000))
    }

    /// Standard monthly installment
    pub fn installment() -> Money {
        Money::new(dec!(5000))
    }
}

/// Fixture for dates
pub struct DateFixtures;

impl DateFixtures {
    /// "Today" of the fixed test clock (Mar 15, 2024)
    pub fn today() -> NaiveDate {
        date(2024, 3, 15)
    }

    /// Standard sale date, inside the six month statistics window
    pub fn sale_date() -> NaiveDate {
        date(2024, 1, 1)
    }

    /// A sale date older than the statistics window
    pub fn old_sale_date() -> NaiveDate {
        date(2023, 6, 1)
    }

    /// Payment date inside the current term
    pub fn recent_payment() -> NaiveDate {
        date(2024, 3, 1)
    }
}

/// Fixture for text fields
pub struct StringFixtures;

impl StringFixtures {
    pub fn buyer_name() -> &'static str {
        "Ali Hassan"
    }

    pub fn other_buyer_name() -> &'static str {
        "Zainab Kareem"
    }

    pub fn mobile_number() -> &'static str {
        "07701234567"
    }

    pub fn building_material() -> &'static str {
        "concrete"
    }

    pub fn resale_source() -> &'static str {
        "walk-in"
    }
}

/// Fixture for measurements
pub struct AreaFixtures;

impl AreaFixtures {
    pub fn plot_area() -> Decimal {
        dec!(200)
    }

    pub fn building_area() -> Decimal {
        dec!(150)
    }
}

/// Shorthand for a calendar date in tests
///
/// # Panics
///
/// Panics on an invalid date.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_house_figures_add_up() {
        assert_eq!(
            MoneyFixtures::down_payment() + MoneyFixtures::loan(),
            MoneyFixtures::house_price()
        );
    }

    #[test]
    fn test_sale_date_precedes_today() {
        assert!(DateFixtures::sale_date() < DateFixtures::today());
        assert!(DateFixtures::old_sale_date() < DateFixtures::sale_date());
    }
}
