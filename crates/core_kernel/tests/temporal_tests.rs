//! Unit tests for the temporal module
//!
//! Tests cover the clocks, date arithmetic used by due-date rules and
//! month bucketing used by reports.

use chrono::{NaiveDate, TimeZone, Utc};
use core_kernel::temporal::{add_days, days_between, sub_months};
use core_kernel::{Clock, FixedClock, Timezone, YearMonth};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

mod clocks {
    use super::*;

    #[test]
    fn test_fixed_clock_now_is_midnight_of_today() {
        let clock = FixedClock::new(date(2024, 2, 15));
        assert_eq!(clock.now().date_naive(), date(2024, 2, 15));
    }

    #[test]
    fn test_timezone_local_date_shifts_across_midnight() {
        let tz = Timezone::default();
        let late_utc = Utc.with_ymd_and_hms(2024, 3, 31, 22, 30, 0).unwrap();
        assert_eq!(tz.local_date(late_utc), date(2024, 4, 1));
    }

    #[test]
    fn test_timezone_serde_round_trip() {
        let tz: Timezone = serde_json::from_str("\"Europe/Istanbul\"").unwrap();
        assert_eq!(serde_json::to_string(&tz).unwrap(), "\"Europe/Istanbul\"");
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_thirty_day_term_from_new_year() {
        assert_eq!(add_days(date(2024, 1, 1), 30).unwrap(), date(2024, 1, 31));
    }

    #[test]
    fn test_thirty_day_term_across_leap_february() {
        assert_eq!(add_days(date(2024, 2, 1), 30).unwrap(), date(2024, 3, 2));
        assert_eq!(add_days(date(2023, 2, 1), 30).unwrap(), date(2023, 3, 3));
    }

    #[test]
    fn test_sub_months_across_year() {
        assert_eq!(sub_months(date(2024, 3, 15), 6).unwrap(), date(2023, 9, 15));
    }

    #[test]
    fn test_days_between_same_day() {
        assert_eq!(days_between(date(2024, 5, 5), date(2024, 5, 5)), 0);
    }
}

mod buckets {
    use super::*;

    #[test]
    fn test_year_month_ordering() {
        let dec = YearMonth::of(date(2023, 12, 31));
        let jan = YearMonth::of(date(2024, 1, 1));
        assert!(dec < jan);
    }
}
