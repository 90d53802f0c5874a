//! Statistics aggregation tests

use chrono::{NaiveDate, TimeZone, Utc};
use core_kernel::{ContractId, HouseId, Money};
use domain_sales::balance::total_debts;
use domain_sales::contract::{Contract, SignatureStatus};
use domain_sales::house::{House, HouseStatus};
use domain_sales::statistics::aggregate;
use proptest::prelude::*;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn house(id: i64, phase: u8, outlook: Option<i64>) -> House {
    House {
        id: HouseId::new(id),
        house_number: id,
        block_number: 1,
        total_area: dec!(250),
        building_area: dec!(180),
        total_price: Money::from_units(150_000),
        down_payment: Money::from_units(50_000),
        loan_amount: Money::from_units(100_000),
        phase,
        outlook: outlook.map(Money::from_units),
        floors: Some(2),
        building_material: None,
        additional_specs: None,
        status: HouseStatus::Sold,
        created_at: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
    }
}

fn contract(id: i64, sale_date: NaiveDate, house_id: Option<i64>, total: i64, paid: i64) -> Contract {
    Contract {
        id: ContractId::new(id),
        contract_number: id,
        sale_date,
        house_number: house_id.unwrap_or(999),
        block_number: 1,
        area: dec!(250),
        floors: 2,
        buyer_name: format!("Buyer {id}"),
        mobile_number: "07500000000".to_string(),
        sale_type: "first_sale".to_string(),
        total_amount: Money::from_units(total),
        down_payment: Money::from_units(paid),
        loan_amount: Money::zero(),
        amount_paid: Money::from_units(paid),
        contract_date: sale_date,
        buyer_signature: SignatureStatus::Pending,
        investor_signature: SignatureStatus::Pending,
        contract_receipt: SignatureStatus::Pending,
        next_payment_due_date: None,
        house_id: house_id.map(HouseId::new),
        receipt_id: None,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

#[test]
fn test_empty_population() {
    let stats = aggregate(&[], &[], date(2024, 3, 15)).unwrap();
    assert_eq!(stats.total_sold_houses, 0);
    assert_eq!(stats.total_revenue, Money::zero());
    assert_eq!(stats.total_debts, Money::zero());
    assert!(stats.phase_sales.is_empty());
    assert!(stats.monthly_sales.is_empty());
}

#[test]
fn test_revenue_counts_positive_outlook_of_resolved_house() {
    let houses = vec![house(1, 1, Some(5_000)), house(2, 2, Some(-1_000)), house(3, 2, None)];
    let contracts = vec![
        contract(1, date(2024, 3, 2), Some(1), 150_000, 50_000),
        contract(2, date(2024, 2, 10), Some(2), 150_000, 40_000),
        contract(3, date(2024, 1, 5), Some(3), 150_000, 30_000),
        contract(4, date(2024, 3, 9), None, 100_000, 20_000),
    ];

    let stats = aggregate(&contracts, &houses, date(2024, 3, 15)).unwrap();

    assert_eq!(stats.total_sold_houses, 4);
    assert_eq!(stats.total_revenue, Money::from_units(50_000 + 5_000 + 40_000 + 30_000 + 20_000));
    assert_eq!(stats.monthly_sold_houses, 2);
    assert_eq!(stats.monthly_revenue, Money::from_units(50_000 + 5_000 + 20_000));
    assert_eq!(stats.phase_sales.get(&1), Some(&1));
    assert_eq!(stats.phase_sales.get(&2), Some(&2));
    assert_eq!(stats.phase_sales.values().sum::<u64>(), 3);
}

#[test]
fn test_monthly_series_is_chronological_and_trailing() {
    let contracts = vec![
        contract(1, date(2024, 3, 1), None, 100, 0),
        contract(2, date(2023, 10, 20), None, 100, 0),
        contract(3, date(2024, 1, 12), None, 100, 0),
        contract(4, date(2024, 1, 30), None, 100, 0),
        contract(5, date(2023, 9, 14), None, 100, 0),
        contract(6, date(2022, 3, 1), None, 100, 0),
    ];

    let stats = aggregate(&contracts, &[], date(2024, 3, 15)).unwrap();
    let series: Vec<(&str, u64)> = stats
        .monthly_sales
        .iter()
        .map(|m| (m.month.as_str(), m.count))
        .collect();
    assert_eq!(series, vec![("2023-10", 1), ("2024-01", 2), ("2024-03", 1)]);
}

#[test]
fn test_total_debts_floors_overpaid_contracts() {
    let contracts = vec![
        contract(1, date(2024, 1, 1), None, 100_000, 40_000),
        contract(2, date(2024, 1, 1), None, 50_000, 80_000),
    ];
    let stats = aggregate(&contracts, &[], date(2024, 3, 15)).unwrap();
    assert_eq!(stats.total_debts, Money::from_units(60_000));
}

proptest! {
    #[test]
    fn total_debts_matches_sum_of_remaining(
        amounts in proptest::collection::vec((1i64..1_000_000i64, 0i64..1_500_000i64), 0..20)
    ) {
        let contracts: Vec<Contract> = amounts
            .iter()
            .enumerate()
            .map(|(i, (total, paid))| contract(i as i64 + 1, date(2024, 1, 1), None, *total, *paid))
            .collect();

        let expected: Money = contracts.iter().map(Contract::remaining_amount).sum();
        let stats = aggregate(&contracts, &[], date(2024, 3, 15)).unwrap();

        prop_assert_eq!(stats.total_debts, expected);
        prop_assert_eq!(total_debts(&contracts), expected);
        prop_assert!(!stats.total_debts.is_negative());
    }
}
