//! Linkage Engine
//!
//! Keeps a receipt and the contract synthesized from it in step. Issuing a
//! receipt sells the referenced house and creates the contract; deleting
//! the receipt removes that contract with its payments and releases the
//! house once nothing else refers to it.
//!
//! Receipts and contracts store each other's id. Records written before the
//! pairing was stored have no link, so deletion falls back to matching the
//! contract by house reference, buyer name and mobile number, and then by
//! house number, buyer name and mobile number. More than one candidate at a
//! level is reported as [`SalesError::LinkageAmbiguity`] instead of picking
//! one.
//!
//! All functions here run inside a caller-owned transaction. They never
//! commit.

use core_kernel::{ContractId, HouseId, Money, ReceiptId};
use tracing::{debug, info, warn};

use crate::contract::{Contract, ContractLinks, NewContract, SignatureStatus, DEFAULT_FLOORS, FIRST_SALE};
use crate::error::SalesError;
use crate::house::{House, HouseStatus};
use crate::ports::RecordTx;
use crate::receipt::{NewReceipt, Receipt, ReceiptIssued, ReceiptRemoval};
use crate::validation::FieldChecks;

/// Builds the contract that accompanies a newly issued receipt
///
/// Amounts come from the house when it has them. A zero house price or
/// loan counts as "not set" and falls back to the receipt's own figures:
/// total = received + remaining, loan = remaining.
pub fn synthesize_contract(receipt: &Receipt, house: Option<&House>, contract_number: i64) -> NewContract {
    let total_amount = house
        .and_then(|h| h.total_price.non_zero())
        .unwrap_or_else(|| declared_total(receipt));
    let loan_amount = house
        .and_then(|h| h.loan_amount.non_zero())
        .unwrap_or(receipt.remaining_amount);

    NewContract {
        contract_number: Some(contract_number),
        sale_date: receipt.receipt_date,
        house_number: receipt.unit_number,
        block_number: receipt.block_number,
        area: receipt.unit_area,
        floors: house.and_then(|h| h.floors).unwrap_or(DEFAULT_FLOORS),
        buyer_name: receipt.buyer_name.clone(),
        mobile_number: receipt.mobile_number.clone(),
        sale_type: FIRST_SALE.to_string(),
        total_amount,
        down_payment: receipt.amount_received,
        loan_amount,
        amount_paid: receipt.amount_received,
        contract_date: receipt.receipt_date,
        buyer_signature: SignatureStatus::Pending,
        investor_signature: SignatureStatus::Pending,
        contract_receipt: SignatureStatus::Pending,
        next_payment_due_date: None,
    }
}

/// Finds the contract paired with a receipt among `contracts`
///
/// A stored link wins when the contract still exists. Otherwise the two
/// heuristic levels are tried in order; the first level with exactly one
/// candidate decides.
pub fn find_linked_contract(receipt: &Receipt, contracts: &[Contract]) -> Result<Option<ContractId>, SalesError> {
    if let Some(linked) = receipt.contract_id {
        if contracts.iter().any(|c| c.id == linked) {
            return Ok(Some(linked));
        }
        warn!(receipt_id = %receipt.id, contract_id = %linked, "Stored contract link is dangling, falling back to matching");
    }

    let same_buyer = |c: &&Contract| {
        c.buyer_name == receipt.buyer_name && c.mobile_number == receipt.mobile_number
    };

    if let Some(house_id) = receipt.house_id {
        let by_house: Vec<ContractId> = contracts
            .iter()
            .filter(|c| c.house_id == Some(house_id))
            .filter(same_buyer)
            .map(|c| c.id)
            .collect();
        if let Some(found) = single_candidate(receipt.id, by_house)? {
            return Ok(Some(found));
        }
    }

    let by_number: Vec<ContractId> = contracts
        .iter()
        .filter(|c| c.house_number == receipt.unit_number)
        .filter(same_buyer)
        .map(|c| c.id)
        .collect();
    single_candidate(receipt.id, by_number)
}

fn single_candidate(receipt_id: ReceiptId, candidates: Vec<ContractId>) -> Result<Option<ContractId>, SalesError> {
    match candidates.len() {
        0 => Ok(None),
        1 => Ok(candidates.into_iter().next()),
        _ => Err(SalesError::LinkageAmbiguity {
            receipt_id,
            candidates,
        }),
    }
}

/// Issues a receipt and creates its contract
///
/// # Arguments
///
/// * `tx` - Open transaction; the caller commits on success
/// * `input` - Receipt fields as entered
///
/// # Returns
///
/// The stored receipt (with its contract link) and the synthesized contract
pub async fn create_receipt_with_contract(
    tx: &mut dyn RecordTx,
    input: NewReceipt,
) -> Result<ReceiptIssued, SalesError> {
    let mut checks = FieldChecks::default();
    checks.merge(input.validate_all());

    if tx.receipt_by_number(input.receipt_number).await?.is_some() {
        checks.fail("receipt_number", format!("receipt number {} already exists", input.receipt_number));
    }

    let house = match input.house_id {
        Some(house_id) => {
            let house = tx.house(house_id).await?;
            match &house {
                None => {
                    checks.fail("house_id", "house does not exist");
                }
                Some(h) if !h.is_available() => {
                    checks.fail("house_id", format!("house {} is {}", h.house_number, h.status));
                }
                Some(_) => {}
            }
            house
        }
        None => None,
    };
    checks.finish()?;

    let receipt = tx.insert_receipt(&input).await?;
    debug!(receipt_id = %receipt.id, receipt_number = receipt.receipt_number, "Receipt inserted");

    if let Some(h) = &house {
        tx.set_house_status(h.id, HouseStatus::Sold).await?;
        debug!(house_id = %h.id, "House marked sold");
    }

    let contract_number = tx.next_contract_number().await?;
    let draft = synthesize_contract(&receipt, house.as_ref(), contract_number);
    let links = ContractLinks {
        house_id: house.as_ref().map(|h| h.id),
        receipt_id: Some(receipt.id),
    };
    let contract = tx.insert_contract(&draft, links).await?;
    tx.link_receipt(receipt.id, Some(contract.id)).await?;

    info!(
        receipt_id = %receipt.id,
        contract_id = %contract.id,
        contract_number = contract.contract_number,
        "Receipt issued with contract"
    );

    Ok(ReceiptIssued {
        receipt: Receipt {
            contract_id: Some(contract.id),
            ..receipt
        },
        contract,
    })
}

/// Deletes a receipt, its paired contract and that contract's payments
///
/// The receipt's house returns to `available` when no remaining contract
/// references it. A soft-deleted house stays deleted.
pub async fn delete_receipt_and_linked_contract(
    tx: &mut dyn RecordTx,
    receipt_id: ReceiptId,
) -> Result<ReceiptRemoval, SalesError> {
    let receipt = tx
        .receipt(receipt_id)
        .await?
        .ok_or_else(|| SalesError::not_found("Receipt", receipt_id))?;

    let contracts = tx.contracts().await?;
    let linked = find_linked_contract(&receipt, &contracts)?;

    let mut payments_removed = 0;
    if let Some(contract_id) = linked {
        payments_removed = tx.delete_payments_for_contract(contract_id).await?;
        tx.delete_contract(contract_id).await?;
        debug!(contract_id = %contract_id, payments_removed, "Linked contract removed");
    } else {
        warn!(receipt_id = %receipt_id, "No contract found for receipt");
    }

    tx.delete_receipt(receipt_id).await?;

    let house_released = match receipt.house_id {
        Some(house_id) => release_house_if_unreferenced(tx, house_id).await?,
        None => None,
    };

    info!(
        receipt_id = %receipt_id,
        contract_id = ?linked,
        payments_removed,
        house_released = ?house_released,
        "Receipt deleted"
    );

    Ok(ReceiptRemoval {
        receipt_id,
        contract_id: linked,
        payments_removed,
        house_released,
    })
}

/// Returns a sold house to `available` when no contract references it
///
/// Returns the house id when the status changed.
pub async fn release_house_if_unreferenced(
    tx: &mut dyn RecordTx,
    house_id: HouseId,
) -> Result<Option<HouseId>, SalesError> {
    if !tx.contracts_for_house(house_id).await?.is_empty() {
        return Ok(None);
    }
    match tx.house(house_id).await? {
        Some(house) if house.status == HouseStatus::Sold => {
            tx.set_house_status(house_id, HouseStatus::Available).await?;
            Ok(Some(house_id))
        }
        _ => Ok(None),
    }
}

/// Total of a receipt's declared figures, used when no house price is known
pub fn declared_total(receipt: &Receipt) -> Money {
    receipt.amount_received + receipt.remaining_amount
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn receipt(house_id: Option<i64>, contract_id: Option<i64>) -> Receipt {
        Receipt {
            id: ReceiptId::new(1),
            receipt_number: 500,
            receipt_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            buyer_name: "Hana Aziz".into(),
            mobile_number: "07700000001".into(),
            unit_number: 12,
            block_number: 3,
            unit_area: dec!(200),
            amount_received: Money::from_units(50_000),
            remaining_amount: Money::from_units(100_000),
            due_date: None,
            notes: None,
            house_id: house_id.map(HouseId::new),
            contract_id: contract_id.map(ContractId::new),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
        }
    }

    fn house(total: i64, loan: i64) -> House {
        House {
            id: HouseId::new(4),
            house_number: 12,
            block_number: 3,
            total_area: dec!(200),
            building_area: dec!(150),
            total_price: Money::from_units(total),
            down_payment: Money::zero(),
            loan_amount: Money::from_units(loan),
            phase: 1,
            outlook: None,
            floors: Some(2),
            building_material: None,
            additional_specs: None,
            status: HouseStatus::Available,
            created_at: Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap(),
        }
    }

    fn contract(id: i64, house_id: Option<i64>, house_number: i64, buyer: &str) -> Contract {
        let r = receipt(None, None);
        let draft = synthesize_contract(&r, None, id);
        Contract {
            id: ContractId::new(id),
            contract_number: id,
            sale_date: draft.sale_date,
            house_number,
            block_number: draft.block_number,
            area: draft.area,
            floors: draft.floors,
            buyer_name: buyer.into(),
            mobile_number: draft.mobile_number,
            sale_type: draft.sale_type,
            total_amount: draft.total_amount,
            down_payment: draft.down_payment,
            loan_amount: draft.loan_amount,
            amount_paid: draft.amount_paid,
            contract_date: draft.contract_date,
            buyer_signature: SignatureStatus::Pending,
            investor_signature: SignatureStatus::Pending,
            contract_receipt: SignatureStatus::Pending,
            next_payment_due_date: None,
            house_id: house_id.map(HouseId::new),
            receipt_id: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
        }
    }

    mod synthesis_tests {
        use super::*;

        #[test]
        fn test_amounts_come_from_house() {
            let h = house(150_000, 90_000);
            let draft = synthesize_contract(&receipt(Some(4), None), Some(&h), 8);

            assert_eq!(draft.contract_number, Some(8));
            assert_eq!(draft.total_amount, Money::from_units(150_000));
            assert_eq!(draft.down_payment, Money::from_units(50_000));
            assert_eq!(draft.amount_paid, Money::from_units(50_000));
            assert_eq!(draft.loan_amount, Money::from_units(90_000));
            assert_eq!(draft.floors, 2);
            assert_eq!(draft.sale_type, FIRST_SALE);
            assert_eq!(draft.buyer_signature, SignatureStatus::Pending);
            assert_eq!(draft.investor_signature, SignatureStatus::Pending);
            assert_eq!(draft.contract_receipt, SignatureStatus::Pending);
        }

        #[test]
        fn test_without_house_uses_declared_figures() {
            let r = receipt(None, None);
            let draft = synthesize_contract(&r, None, 1);
            assert_eq!(draft.total_amount, declared_total(&r));
            assert_eq!(draft.loan_amount, Money::from_units(100_000));
            assert_eq!(draft.floors, DEFAULT_FLOORS);
        }

        #[test]
        fn test_zero_house_loan_falls_back_to_remaining() {
            let h = house(150_000, 0);
            let draft = synthesize_contract(&receipt(Some(4), None), Some(&h), 1);
            assert_eq!(draft.loan_amount, Money::from_units(100_000));
        }

        #[test]
        fn test_dates_follow_receipt() {
            let r = receipt(None, None);
            let draft = synthesize_contract(&r, None, 1);
            assert_eq!(draft.sale_date, r.receipt_date);
            assert_eq!(draft.contract_date, r.receipt_date);
        }
    }

    mod matching_tests {
        use super::*;

        #[test]
        fn test_stored_link_wins() {
            let contracts = vec![
                contract(1, Some(4), 12, "Hana Aziz"),
                contract(2, Some(4), 12, "Hana Aziz"),
            ];
            let found = find_linked_contract(&receipt(Some(4), Some(2)), &contracts).unwrap();
            assert_eq!(found, Some(ContractId::new(2)));
        }

        #[test]
        fn test_matches_by_house_reference() {
            let contracts = vec![
                contract(1, Some(9), 12, "Hana Aziz"),
                contract(2, Some(4), 12, "Hana Aziz"),
            ];
            let found = find_linked_contract(&receipt(Some(4), None), &contracts).unwrap();
            assert_eq!(found, Some(ContractId::new(2)));
        }

        #[test]
        fn test_falls_back_to_house_number() {
            let contracts = vec![contract(3, None, 12, "Hana Aziz")];
            let found = find_linked_contract(&receipt(Some(4), None), &contracts).unwrap();
            assert_eq!(found, Some(ContractId::new(3)));
        }

        #[test]
        fn test_other_buyer_does_not_match() {
            let contracts = vec![contract(3, Some(4), 12, "Someone Else")];
            let found = find_linked_contract(&receipt(Some(4), None), &contracts).unwrap();
            assert_eq!(found, None);
        }

        #[test]
        fn test_tie_is_reported() {
            let contracts = vec![
                contract(5, None, 12, "Hana Aziz"),
                contract(6, None, 12, "Hana Aziz"),
            ];
            let err = find_linked_contract(&receipt(None, None), &contracts).unwrap_err();
            match err {
                SalesError::LinkageAmbiguity { candidates, .. } => {
                    assert_eq!(candidates, vec![ContractId::new(5), ContractId::new(6)]);
                }
                other => panic!("expected ambiguity, got {other:?}"),
            }
        }

        #[test]
        fn test_dangling_link_uses_heuristic() {
            let contracts = vec![contract(3, Some(4), 12, "Hana Aziz")];
            let found = find_linked_contract(&receipt(Some(4), Some(99)), &contracts).unwrap();
            assert_eq!(found, Some(ContractId::new(3)));
        }
    }
}
