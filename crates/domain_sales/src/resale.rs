//! Resale listings
//!
//! Leads for reselling a house that has already been sold. Listings carry
//! no balance linkage; the view joins in the house (and the latest contract
//! on it) so the caller can show the unit without extra lookups.

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{HouseId, Money, ResaleId};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::contract::Contract;
use crate::house::{House, HouseStatus};
use crate::validation::{FieldChecks, Presence, ValidationErrors};

/// A stored resale listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResaleListing {
    pub id: ResaleId,
    pub house_id: HouseId,
    /// Where the lead came from
    pub source: String,
    pub mobile_number: String,
    pub contact_date: NaiveDate,
    pub remaining_amount: Option<Money>,
    pub floors: Option<i32>,
    pub building_material: Option<String>,
    pub additional_specs: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewResaleListing {
    pub house_id: HouseId,
    #[validate(length(max = 200))]
    pub source: String,
    #[validate(length(max = 20))]
    pub mobile_number: String,
    pub contact_date: NaiveDate,
    #[serde(default)]
    pub remaining_amount: Option<Money>,
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

impl NewResaleListing {
    /// Checks the listing against the house it points at
    ///
    /// `house` is the lookup result for `house_id`; a missing or unsold
    /// house is reported alongside the field errors.
    pub fn validate_against(&self, house: Option<&House>) -> Result<(), ValidationErrors> {
        let mut checks = self.field_checks();
        match house {
            None => {
                checks.fail("house_id", "house does not exist");
            }
            Some(h) if h.status != HouseStatus::Sold => {
                checks.fail("house_id", format!("house is {}, only sold houses can be resold", h.status));
            }
            Some(_) => {}
        }
        checks.finish()
    }

    /// Checks the fields that do not depend on the house
    pub fn validate_fields(&self) -> Result<(), ValidationErrors> {
        self.field_checks().finish()
    }

    fn field_checks(&self) -> FieldChecks {
        let mut checks = FieldChecks::from_derive(self);
        checks
            .require_text("source", &self.source)
            .require_text("mobile_number", &self.mobile_number);
        if let Some(amount) = self.remaining_amount {
            checks.require_non_negative("remaining_amount", amount);
        }
        checks
    }
}

/// Listing input as submitted, before required keys are checked
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResaleDraft {
    pub house_id: Option<HouseId>,
    pub source: Option<String>,
    pub mobile_number: Option<String>,
    pub contact_date: Option<NaiveDate>,
    pub remaining_amount: Option<Money>,
    pub floors: Option<i32>,
    pub building_material: Option<String>,
    pub additional_specs: Option<String>,
}

impl ResaleDraft {
    /// Completes the draft; the house itself is checked when the listing is stored
    pub fn into_input(self) -> Result<NewResaleListing, ValidationErrors> {
        let mut presence = Presence::default();
        let input = NewResaleListing {
            house_id: presence.take_or("house_id", self.house_id, HouseId::new(0)),
            source: presence.take("source", self.source),
            mobile_number: presence.take("mobile_number", self.mobile_number),
            contact_date: presence.take_or("contact_date", self.contact_date, NaiveDate::MIN),
            remaining_amount: self.remaining_amount,
            floors: self.floors,
            building_material: self.building_material,
            additional_specs: self.additional_specs,
        };
        presence.conclude(input, NewResaleListing::validate_fields)
    }
}

/// House details shown next to a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseSummary {
    pub house_number: i64,
    pub block_number: i64,
    pub phase: u8,
    pub total_price: Money,
    pub status: HouseStatus,
}

impl From<&House> for HouseSummary {
    fn from(house: &House) -> Self {
        Self {
            house_number: house.house_number,
            block_number: house.block_number,
            phase: house.phase,
            total_price: house.total_price,
            status: house.status,
        }
    }
}

/// A listing joined with its house
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResaleView {
    #[serde(flatten)]
    pub listing: ResaleListing,
    pub house: Option<HouseSummary>,
}

impl ResaleView {
    /// Builds the view, filling gaps in the listing from the house and
    /// then from the latest contract on that house
    pub fn assemble(
        mut listing: ResaleListing,
        house: Option<&House>,
        latest_contract: Option<&Contract>,
    ) -> Self {
        if listing.floors.is_none() {
            listing.floors = house
                .and_then(|h| h.floors)
                .or_else(|| latest_contract.map(|c| c.floors));
        }
        if listing.building_material.is_none() {
            listing.building_material = house.and_then(|h| h.building_material.clone());
        }
        Self {
            house: house.map(HouseSummary::from),
            listing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn house(status: HouseStatus) -> House {
        House {
            id: HouseId::new(1),
            house_number: 7,
            block_number: 2,
            total_area: dec!(200),
            building_area: dec!(120),
            total_price: Money::from_units(150_000),
            down_payment: Money::zero(),
            loan_amount: Money::zero(),
            phase: 1,
            outlook: None,
            floors: None,
            building_material: Some("brick".into()),
            additional_specs: None,
            status,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn input() -> NewResaleListing {
        NewResaleListing {
            house_id: HouseId::new(1),
            source: "walk-in".into(),
            mobile_number: "07501112233".into(),
            contact_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            remaining_amount: None,
            floors: None,
            building_material: None,
            additional_specs: None,
        }
    }

    #[test]
    fn test_requires_sold_house() {
        let available = house(HouseStatus::Available);
        let errors = input().validate_against(Some(&available)).unwrap_err();
        assert!(errors.has_field("house_id"));

        let sold = house(HouseStatus::Sold);
        assert!(input().validate_against(Some(&sold)).is_ok());
    }

    #[test]
    fn test_missing_house_and_blank_source_together() {
        let mut bad = input();
        bad.source = String::new();
        let errors = bad.validate_against(None).unwrap_err();
        assert!(errors.has_field("house_id"));
        assert!(errors.has_field("source"));
    }

    #[test]
    fn test_view_fills_material_from_house() {
        let listing = ResaleListing {
            id: ResaleId::new(1),
            house_id: HouseId::new(1),
            source: "walk-in".into(),
            mobile_number: "07501112233".into(),
            contact_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            remaining_amount: None,
            floors: None,
            building_material: None,
            additional_specs: None,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
        };
        let sold = house(HouseStatus::Sold);
        let view = ResaleView::assemble(listing, Some(&sold), None);
        assert_eq!(view.listing.building_material.as_deref(), Some("brick"));
        assert_eq!(view.listing.floors, None);
        assert_eq!(view.house.map(|h| h.house_number), Some(7));
    }
}
