//! Houses (sellable units)
//!
//! A house is the root record of the ledger. Contracts and resale listings
//! point at it by id, and its status follows the contracts that reference
//! it: `available` until the first sale, `sold` while any contract refers
//! to it, `deleted` once withdrawn from the catalogue.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use core_kernel::{HouseId, Money};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::{FieldChecks, Presence, ValidationErrors};

/// Sales status of a house
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HouseStatus {
    #[default]
    Available,
    Sold,
    /// Soft-deleted; hidden from listings, still resolvable by id
    Deleted,
}

impl HouseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HouseStatus::Available => "available",
            HouseStatus::Sold => "sold",
            HouseStatus::Deleted => "deleted",
        }
    }
}

impl fmt::Display for HouseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HouseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(HouseStatus::Available),
            "sold" => Ok(HouseStatus::Sold),
            "deleted" => Ok(HouseStatus::Deleted),
            other => Err(format!("unknown house status '{other}'")),
        }
    }
}

/// A stored house
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct House {
    pub id: HouseId,
    /// Business key, unique across all houses
    pub house_number: i64,
    pub block_number: i64,
    /// Plot area in square metres
    pub total_area: Decimal,
    /// Built area in square metres
    pub building_area: Decimal,
    pub total_price: Money,
    pub down_payment: Money,
    pub loan_amount: Money,
    pub phase: u8,
    /// Optional bonus amount counted towards revenue
    pub outlook: Option<Money>,
    pub floors: Option<i32>,
    pub building_material: Option<String>,
    pub additional_specs: Option<String>,
    pub status: HouseStatus,
    pub created_at: DateTime<Utc>,
}

impl House {
    pub fn is_available(&self) -> bool {
        self.status == HouseStatus::Available
    }

    pub fn is_sold(&self) -> bool {
        self.status == HouseStatus::Sold
    }

    /// The outlook amount when one is set and positive
    pub fn positive_outlook(&self) -> Option<Money> {
        self.outlook.filter(Money::is_positive)
    }
}

/// Input for creating or updating a house
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewHouse {
    pub house_number: i64,
    pub block_number: i64,
    pub total_area: Decimal,
    pub building_area: Decimal,
    pub total_price: Money,
    #[serde(default)]
    pub down_payment: Money,
    #[serde(default)]
    pub loan_amount: Money,
    #[validate(range(min = 1, max = 5, message = "must be between 1 and 5"))]
    pub phase: u8,
    #[serde(default)]
    pub outlook: Option<Money>,
    #[serde(default)]
    #[validate(range(min = 1, max = 50, message = "must be between 1 and 50"))]
    pub floors: Option<i32>,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub building_material: Option<String>,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub additional_specs: Option<String>,
}

impl NewHouse {
    /// Checks every field and reports all failures at once
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        let mut checks = FieldChecks::from_derive(self);
        checks
            .require_positive_id("house_number", self.house_number)
            .require_positive_id("block_number", self.block_number)
            .require_non_negative_measure("total_area", self.total_area)
            .require_non_negative_measure("building_area", self.building_area)
            .require_positive("total_price", self.total_price)
            .require_non_negative("down_payment", self.down_payment)
            .require_non_negative("loan_amount", self.loan_amount);
        if let Some(outlook) = self.outlook {
            checks.require_non_negative("outlook", outlook);
        }
        checks.finish()
    }
}

/// House input as submitted, before required keys are checked
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HouseDraft {
    pub house_number: Option<i64>,
    pub block_number: Option<i64>,
    pub total_area: Option<Decimal>,
    pub building_area: Option<Decimal>,
    pub total_price: Option<Money>,
    pub down_payment: Option<Money>,
    pub loan_amount: Option<Money>,
    pub phase: Option<u8>,
    pub outlook: Option<Money>,
    pub floors: Option<i32>,
    pub building_material: Option<String>,
    pub additional_specs: Option<String>,
}

impl HouseDraft {
    /// Completes the draft, reporting absent keys with every other failure
    pub fn into_input(self) -> Result<NewHouse, ValidationErrors> {
        let mut presence = Presence::default();
        let input = NewHouse {
            house_number: presence.take("house_number", self.house_number),
            block_number: presence.take("block_number", self.block_number),
            total_area: presence.take("total_area", self.total_area),
            building_area: presence.take("building_area", self.building_area),
            total_price: presence.take("total_price", self.total_price),
            down_payment: self.down_payment.unwrap_or_default(),
            loan_amount: self.loan_amount.unwrap_or_default(),
            phase: presence.take("phase", self.phase),
            outlook: self.outlook,
            floors: self.floors,
            building_material: self.building_material,
            additional_specs: self.additional_specs,
        };
        presence.conclude(input, NewHouse::validate_all)
    }
}

/// Filter for house listings
///
/// Deleted houses never appear in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseFilter {
    #[serde(default)]
    pub phase: Option<u8>,
    /// When false only `available` houses are returned
    #[serde(default = "include_sold_default")]
    pub include_sold: bool,
}

fn include_sold_default() -> bool {
    true
}

impl Default for HouseFilter {
    fn default() -> Self {
        Self {
            phase: None,
            include_sold: true,
        }
    }
}

impl HouseFilter {
    pub fn available_only() -> Self {
        Self {
            include_sold: false,
            ..Default::default()
        }
    }

    pub fn in_phase(mut self, phase: u8) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Applies the filter to a single house
    pub fn matches(&self, house: &House) -> bool {
        if house.status == HouseStatus::Deleted {
            return false;
        }
        if !self.include_sold && house.status != HouseStatus::Available {
            return false;
        }
        self.phase.map_or(true, |p| house.phase == p)
    }
}

/// Request to stock the catalogue with generated houses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct BulkHouses {
    #[serde(default = "bulk_count_default")]
    #[validate(range(min = 1, max = 1000, message = "must be between 1 and 1000"))]
    pub count: u32,
    /// Fixes the generated values; a fresh seed is drawn when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

fn bulk_count_default() -> u32 {
    100
}

impl Default for BulkHouses {
    fn default() -> Self {
        Self {
            count: bulk_count_default(),
            seed: None,
        }
    }
}

/// Outcome of a bulk house creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkHouseReport {
    pub added: u32,
    /// Generated houses that were rejected and skipped
    pub errors: u32,
    pub first_house_number: Option<i64>,
    pub last_house_number: Option<i64>,
}

/// Generates a plausible catalogue entry under `house_number`
///
/// Plots are 150 to 249 m2 with 70 to 90% built, priced per square metre.
/// The down payment is 15 to 30% of the price and the loan covers the rest.
/// About three houses in ten carry an outlook bonus and special specs.
pub fn sample_house<R: Rng + ?Sized>(house_number: i64, rng: &mut R) -> NewHouse {
    let area: i64 = rng.gen_range(150..250);
    let built_percent: i64 = rng.gen_range(70..=90);
    let price = area * rng.gen_range(800_000..=1_200_000i64);
    let down_payment = price * rng.gen_range(15..=30i64) / 100;

    NewHouse {
        house_number,
        block_number: rng.gen_range(1..=10),
        total_area: Decimal::from(area),
        building_area: Decimal::new(area * built_percent, 2),
        total_price: Money::from_units(price),
        down_payment: Money::from_units(down_payment),
        loan_amount: Money::from_units(price - down_payment),
        phase: rng.gen_range(1..=5),
        outlook: rng
            .gen_bool(0.3)
            .then(|| Money::from_units(rng.gen_range(500_000..=2_000_000))),
        floors: None,
        building_material: None,
        additional_specs: rng.gen_bool(0.3).then(|| "Special specifications".to_string()),
    }
}

/// A sold house together with the sale that claimed it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoldHouse {
    #[serde(flatten)]
    pub house: House,
    pub buyer_name: String,
    pub contract_date: chrono::NaiveDate,
    pub contract_number: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal_macros::dec;

    fn input() -> NewHouse {
        NewHouse {
            house_number: 12,
            block_number: 3,
            total_area: dec!(200),
            building_area: dec!(150),
            total_price: Money::from_units(150_000),
            down_payment: Money::from_units(30_000),
            loan_amount: Money::from_units(60_000),
            phase: 2,
            outlook: None,
            floors: Some(2),
            building_material: None,
            additional_specs: None,
        }
    }

    #[test]
    fn test_valid_input_passes() {
        assert!(input().validate_all().is_ok());
    }

    #[test]
    fn test_phase_and_price_reported_together() {
        let mut bad = input();
        bad.phase = 9;
        bad.total_price = Money::zero();
        let errors = bad.validate_all().unwrap_err();
        assert!(errors.has_field("phase"));
        assert!(errors.has_field("total_price"));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_status_round_trip() {
        for status in [HouseStatus::Available, HouseStatus::Sold, HouseStatus::Deleted] {
            assert_eq!(status.as_str().parse::<HouseStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_sample_houses_are_valid() {
        let mut rng = StdRng::seed_from_u64(7);
        for number in 1..=200 {
            let house = sample_house(number, &mut rng);
            assert!(house.validate_all().is_ok(), "house {number}: {house:?}");
            assert_eq!(house.down_payment + house.loan_amount, house.total_price);
            assert!(house.building_area <= house.total_area);
        }
    }

    #[test]
    fn test_same_seed_same_houses() {
        let first = sample_house(1, &mut StdRng::seed_from_u64(42));
        let second = sample_house(1, &mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }

    #[test]
    fn test_bulk_request_defaults_to_one_hundred() {
        let request: BulkHouses = serde_json::from_str("{}").unwrap();
        assert_eq!(request, BulkHouses::default());
        assert_eq!(request.count, 100);

        let too_many = BulkHouses { count: 5000, seed: None };
        assert!(too_many.validate().is_err());
    }

    #[test]
    fn test_filter_defaults_include_sold() {
        let filter: HouseFilter = serde_json::from_str("{}").unwrap();
        assert!(filter.include_sold);
        assert_eq!(filter.phase, None);
    }
}
