//! Unit tests for the identifier newtypes

use core_kernel::{ContractId, HouseId, PaymentId, ReceiptId, ResaleId};

#[test]
fn test_serde_is_transparent_integer() {
    let json = serde_json::to_string(&HouseId::new(5)).unwrap();
    assert_eq!(json, "5");
    let back: HouseId = serde_json::from_str("5").unwrap();
    assert_eq!(back, HouseId::new(5));
}

#[test]
fn test_prefixes_are_distinct() {
    let prefixes = [
        HouseId::prefix(),
        ReceiptId::prefix(),
        ContractId::prefix(),
        PaymentId::prefix(),
        ResaleId::prefix(),
    ];
    let mut sorted = prefixes.to_vec();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), prefixes.len());
}

#[test]
fn test_parse_rejects_non_numeric() {
    assert!("PAY-abc".parse::<PaymentId>().is_err());
}

#[test]
fn test_raw_conversions() {
    let id = ResaleId::from(9);
    let raw: i64 = id.into();
    assert_eq!(raw, 9);
}
