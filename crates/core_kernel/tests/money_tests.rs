//! Unit tests for the Money module
//!
//! Tests cover creation, parsing, arithmetic and the zero floor used by
//! balance calculations.

use core_kernel::{Money, MoneyError};
use rust_decimal_macros::dec;

mod creation {
    use super::*;

    #[test]
    fn test_new_rounds_to_four_decimal_places() {
        let m = Money::new(dec!(100.123456789));
        assert_eq!(m.amount(), dec!(100.1235));
    }

    #[test]
    fn test_from_units() {
        assert_eq!(Money::from_units(150_000).amount(), dec!(150000));
    }

    #[test]
    fn test_zero_is_default() {
        assert_eq!(Money::default(), Money::zero());
        assert!(Money::zero().is_zero());
    }
}

mod parsing {
    use super::*;

    #[test]
    fn test_parse_decimal_text() {
        let m: Money = "  2500.75 ".parse().unwrap();
        assert_eq!(m.amount(), dec!(2500.75));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = "twelve".parse::<Money>().unwrap_err();
        assert_eq!(err, MoneyError::InvalidAmount("twelve".to_string()));
    }

    #[test]
    fn test_serde_accepts_numbers_and_strings() {
        let from_number: Money = serde_json::from_str("50000").unwrap();
        let from_string: Money = serde_json::from_str("\"50000\"").unwrap();
        assert_eq!(from_number, from_string);
    }
}

mod predicates {
    use super::*;

    #[test]
    fn test_is_positive() {
        assert!(Money::new(dec!(0.01)).is_positive());
        assert!(!Money::zero().is_positive());
        assert!(!Money::new(dec!(-5)).is_positive());
    }

    #[test]
    fn test_ensure_positive() {
        assert!(Money::new(dec!(10)).ensure_positive().is_ok());
        assert!(matches!(
            Money::zero().ensure_positive(),
            Err(MoneyError::NotPositive(_))
        ));
    }

    #[test]
    fn test_non_zero() {
        assert_eq!(Money::zero().non_zero(), None);
        assert_eq!(Money::from_units(3).non_zero(), Some(Money::from_units(3)));
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_add_assign() {
        let mut paid = Money::from_units(50_000);
        paid += Money::from_units(25_000);
        assert_eq!(paid, Money::from_units(75_000));
    }

    #[test]
    fn test_saturating_sub_exact_zero() {
        let total = Money::from_units(100_000);
        assert!(total.saturating_sub(total).is_zero());
    }

    #[test]
    fn test_plain_sub_can_go_negative() {
        let diff = Money::from_units(10) - Money::from_units(30);
        assert!(diff.is_negative());
    }

    #[test]
    fn test_sum_of_references() {
        let payments = vec![Money::from_units(10), Money::from_units(20)];
        let total: Money = payments.iter().sum();
        assert_eq!(total, Money::from_units(30));
    }
}
