//! Calendar handling for due dates and reporting periods
//!
//! Business dates (receipt, sale, payment, contact dates) are plain
//! calendar dates with no time component. "Today" depends on where the
//! sales office is, so it comes from a [`Clock`] bound to a time zone
//! instead of being read from the process environment.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;
use thiserror::Error;

/// Timezone wrapper for the sales office location
///
/// Wraps chrono_tz::Tz with custom serialization support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timezone(pub Tz);

impl Serialize for Timezone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.name())
    }
}

impl<'de> Deserialize<'de> for Timezone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl FromStr for Timezone {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tz::from_str(s)
            .map(Timezone)
            .map_err(|_| TemporalError::InvalidTimezone(s.to_string()))
    }
}

impl Timezone {
    pub fn new(tz: Tz) -> Self {
        Self(tz)
    }

    /// Returns the local calendar date of a UTC instant
    pub fn local_date(&self, utc: DateTime<Utc>) -> NaiveDate {
        utc.with_timezone(&self.0).date_naive()
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Self(chrono_tz::Asia::Baghdad)
    }
}

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Date out of range: {0}")]
    OutOfRange(String),
}

/// Source of the current date and time
///
/// Engines that classify records relative to "today" take a clock so that
/// tests can pin the date.
pub trait Clock: Send + Sync {
    /// The current instant
    fn now(&self) -> DateTime<Utc>;

    /// The current local calendar date
    fn today(&self) -> NaiveDate;
}

/// Wall clock interpreted in a fixed time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    timezone: Timezone,
}

impl SystemClock {
    pub fn new(timezone: Timezone) -> Self {
        Self { timezone }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        self.timezone.local_date(Utc::now())
    }
}

/// Clock pinned to a single date, for tests and replays
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    today: NaiveDate,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.today.and_time(chrono::NaiveTime::MIN).and_utc()
    }

    fn today(&self) -> NaiveDate {
        self.today
    }
}

/// Adds whole days to a date
pub fn add_days(date: NaiveDate, days: u32) -> Result<NaiveDate, TemporalError> {
    date.checked_add_days(Days::new(u64::from(days)))
        .ok_or_else(|| TemporalError::OutOfRange(format!("{date} + {days} days")))
}

/// Subtracts calendar months, clamping to the end of shorter months
pub fn sub_months(date: NaiveDate, months: u32) -> Result<NaiveDate, TemporalError> {
    date.checked_sub_months(Months::new(months))
        .ok_or_else(|| TemporalError::OutOfRange(format!("{date} - {months} months")))
}

/// Whole days from `earlier` to `later`; negative when `later` precedes `earlier`
pub fn days_between(earlier: NaiveDate, later: NaiveDate) -> i64 {
    (later - earlier).num_days()
}

/// Year and month of a date, the bucket key used for monthly reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_add_days_crosses_month() {
        assert_eq!(add_days(date(2024, 1, 1), 30).unwrap(), date(2024, 1, 31));
        assert_eq!(add_days(date(2024, 2, 1), 30).unwrap(), date(2024, 3, 2));
    }

    #[test]
    fn test_sub_months_clamps() {
        assert_eq!(sub_months(date(2024, 8, 31), 6).unwrap(), date(2024, 2, 29));
    }

    #[test]
    fn test_days_between() {
        assert_eq!(days_between(date(2024, 1, 31), date(2024, 2, 15)), 15);
        assert_eq!(days_between(date(2024, 2, 15), date(2024, 1, 31)), -15);
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::new(date(2024, 2, 15));
        assert_eq!(clock.today(), date(2024, 2, 15));
    }

    #[test]
    fn test_year_month_display() {
        assert_eq!(YearMonth::of(date(2024, 3, 9)).to_string(), "2024-03");
    }

    #[test]
    fn test_timezone_parse() {
        let tz: Timezone = "Asia/Baghdad".parse().unwrap();
        assert_eq!(tz, Timezone::default());
        assert!("Mars/Olympus".parse::<Timezone>().is_err());
    }
}
