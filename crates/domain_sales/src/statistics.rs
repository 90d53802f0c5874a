//! Sales statistics
//!
//! Aggregates are recomputed from the full contract and house collections
//! on every call.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use core_kernel::temporal::{sub_months, TemporalError};
use core_kernel::{HouseId, Money, YearMonth};
use serde::{Deserialize, Serialize};

use crate::balance;
use crate::contract::Contract;
use crate::house::House;

/// Length of the trailing window of the monthly series
pub const MONTHLY_WINDOW: u32 = 6;

/// Number of sales in one calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySales {
    /// `YYYY-MM`
    pub month: String,
    pub count: u64,
}

/// Dashboard figures over all contracts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesStatistics {
    /// Every contract counts as one sold house
    pub total_sold_houses: u64,
    pub monthly_sold_houses: u64,
    /// Down payments of all contracts plus the positive outlook of each
    /// contract's house
    pub total_revenue: Money,
    pub monthly_revenue: Money,
    /// Sum of outstanding balances
    pub total_debts: Money,
    /// Contract count per phase of the linked house
    pub phase_sales: BTreeMap<u8, u64>,
    /// Sales per month since six months before `today`, oldest first
    pub monthly_sales: Vec<MonthlySales>,
}

impl SalesStatistics {
    pub fn empty() -> Self {
        Self {
            total_sold_houses: 0,
            monthly_sold_houses: 0,
            total_revenue: Money::zero(),
            monthly_revenue: Money::zero(),
            total_debts: Money::zero(),
            phase_sales: BTreeMap::new(),
            monthly_sales: Vec::new(),
        }
    }
}

/// Computes the statistics as of `today`
pub fn aggregate(contracts: &[Contract], houses: &[House], today: NaiveDate) -> Result<SalesStatistics, TemporalError> {
    let by_id: HashMap<HouseId, &House> = houses.iter().map(|h| (h.id, h)).collect();
    let current_month = YearMonth::of(today);
    let window_start = sub_months(today, MONTHLY_WINDOW)?;

    let mut stats = SalesStatistics::empty();
    let mut buckets: BTreeMap<YearMonth, u64> = BTreeMap::new();

    for contract in contracts {
        let house = contract.house_id.and_then(|id| by_id.get(&id).copied());
        let in_current_month = YearMonth::of(contract.sale_date) == current_month;

        let revenue = contract.down_payment + house.and_then(House::positive_outlook).unwrap_or_default();

        stats.total_sold_houses += 1;
        stats.total_revenue += revenue;
        if in_current_month {
            stats.monthly_sold_houses += 1;
            stats.monthly_revenue += revenue;
        }

        if let Some(h) = house {
            *stats.phase_sales.entry(h.phase).or_default() += 1;
        }

        if contract.sale_date >= window_start {
            *buckets.entry(YearMonth::of(contract.sale_date)).or_default() += 1;
        }
    }

    stats.total_debts = balance::total_debts(contracts);
    stats.monthly_sales = buckets
        .into_iter()
        .map(|(month, count)| MonthlySales {
            month: month.to_string(),
            count,
        })
        .collect();

    Ok(stats)
}
