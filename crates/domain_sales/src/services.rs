//! Sales ledger application service
//!
//! `LocalSalesService` implements [`SalesPort`] by running the engines
//! against a [`RecordStore`]. Every operation opens one transaction, does
//! all of its reads and writes inside it and commits at the end, so a
//! failure part-way through leaves nothing behind.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, instrument, warn};

use core_kernel::{
    Clock, ContractId, DomainPort, HealthCheckResult, HealthCheckable, HouseId, Money, PaymentId,
    ReceiptId, ResaleId,
};

use crate::balance;
use crate::contract::{Contract, ContractLinks, NewContract};
use crate::error::SalesError;
use crate::house::{self, BulkHouseReport, BulkHouses, House, HouseFilter, HouseStatus, NewHouse, SoldHouse};
use crate::linkage;
use crate::payment::{NewPayment, Payment};
use crate::ports::{RecordStore, RecordTx, SalesPort};
use crate::receipt::{NewReceipt, Receipt, ReceiptIssued, ReceiptRemoval};
use crate::resale::{NewResaleListing, ResaleView};
use crate::statistics::{self, SalesStatistics};
use crate::validation::FieldChecks;

/// Engines over a local record store
pub struct LocalSalesService {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
}

impl LocalSalesService {
    /// Creates the service
    ///
    /// # Arguments
    ///
    /// * `store` - Storage backend, shared with other users of the same file
    /// * `clock` - Source of "today" for monthly statistics
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    async fn begin(&self) -> Result<Box<dyn RecordTx>, SalesError> {
        Ok(self.store.begin().await?)
    }
}

/// Looks up a house by business key for linking, ignoring withdrawn houses
async fn linkable_house(tx: &mut dyn RecordTx, house_number: i64) -> Result<Option<House>, SalesError> {
    Ok(tx
        .house_by_number(house_number)
        .await?
        .filter(|h| h.status != HouseStatus::Deleted))
}

async fn mark_sold(tx: &mut dyn RecordTx, house: &House) -> Result<(), SalesError> {
    if house.is_available() {
        tx.set_house_status(house.id, HouseStatus::Sold).await?;
    }
    Ok(())
}

/// Latest contract on a house by contract date
fn latest_contract(contracts: &[Contract]) -> Option<&Contract> {
    contracts
        .iter()
        .max_by(|a, b| a.contract_date.cmp(&b.contract_date).then(a.id.cmp(&b.id)))
}

impl DomainPort for LocalSalesService {}

#[async_trait]
impl HealthCheckable for LocalSalesService {
    async fn health_check(&self) -> HealthCheckResult {
        self.store.health_check().await
    }
}

#[async_trait]
impl SalesPort for LocalSalesService {
    // ------------------------------------------------------------------
    // Houses
    // ------------------------------------------------------------------

    #[instrument(skip(self))]
    async fn list_houses(&self, filter: HouseFilter) -> Result<Vec<House>, SalesError> {
        let mut tx = self.begin().await?;
        let houses = tx.houses(&filter).await?;
        tx.commit().await?;
        Ok(houses)
    }

    #[instrument(skip(self))]
    async fn get_house(&self, id: HouseId) -> Result<House, SalesError> {
        let mut tx = self.begin().await?;
        let house = tx.house(id).await?.ok_or_else(|| SalesError::not_found("House", id))?;
        tx.commit().await?;
        Ok(house)
    }

    #[instrument(skip(self, house), fields(house_number = house.house_number))]
    async fn create_house(&self, house: NewHouse) -> Result<House, SalesError> {
        let mut tx = self.begin().await?;
        let mut checks = FieldChecks::default();
        checks.merge(house.validate_all());
        if tx.house_by_number(house.house_number).await?.is_some() {
            checks.fail("house_number", format!("house number {} already exists", house.house_number));
        }
        checks.finish()?;

        let created = tx.insert_house(&house).await?;
        tx.commit().await?;
        info!(house_id = %created.id, house_number = created.house_number, "House created");
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn create_houses_bulk(&self, request: BulkHouses) -> Result<BulkHouseReport, SalesError> {
        FieldChecks::from_derive(&request).finish()?;
        let mut rng = match request.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut tx = self.begin().await?;
        let mut next_number = tx.max_house_number().await?.unwrap_or(0) + 1;
        let mut report = BulkHouseReport {
            added: 0,
            errors: 0,
            first_house_number: None,
            last_house_number: None,
        };

        for _ in 0..request.count {
            let candidate = house::sample_house(next_number, &mut rng);
            next_number += 1;
            if let Err(errors) = candidate.validate_all() {
                warn!(house_number = candidate.house_number, %errors, "Generated house rejected");
                report.errors += 1;
                continue;
            }
            let created = tx.insert_house(&candidate).await?;
            report.first_house_number.get_or_insert(created.house_number);
            report.last_house_number = Some(created.house_number);
            report.added += 1;
        }

        tx.commit().await?;
        info!(added = report.added, errors = report.errors, "Houses generated");
        Ok(report)
    }

    #[instrument(skip(self, house), fields(house_number = house.house_number))]
    async fn update_house(&self, id: HouseId, house: NewHouse) -> Result<House, SalesError> {
        let mut tx = self.begin().await?;
        tx.house(id).await?.ok_or_else(|| SalesError::not_found("House", id))?;

        let mut checks = FieldChecks::default();
        checks.merge(house.validate_all());
        if let Some(other) = tx.house_by_number(house.house_number).await? {
            if other.id != id {
                checks.fail("house_number", format!("house number {} already exists", house.house_number));
            }
        }
        checks.finish()?;

        let updated = tx.update_house(id, &house).await?;
        tx.commit().await?;
        info!(house_id = %id, "House updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn delete_house(&self, id: HouseId) -> Result<(), SalesError> {
        let mut tx = self.begin().await?;
        tx.house(id).await?.ok_or_else(|| SalesError::not_found("House", id))?;
        tx.set_house_status(id, HouseStatus::Deleted).await?;
        tx.commit().await?;
        info!(house_id = %id, "House withdrawn");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Receipts
    // ------------------------------------------------------------------

    #[instrument(skip(self))]
    async fn list_receipts(&self) -> Result<Vec<Receipt>, SalesError> {
        let mut tx = self.begin().await?;
        let receipts = tx.receipts().await?;
        tx.commit().await?;
        Ok(receipts)
    }

    #[instrument(skip(self))]
    async fn get_receipt(&self, id: ReceiptId) -> Result<Receipt, SalesError> {
        let mut tx = self.begin().await?;
        let receipt = tx.receipt(id).await?.ok_or_else(|| SalesError::not_found("Receipt", id))?;
        tx.commit().await?;
        Ok(receipt)
    }

    #[instrument(skip(self, receipt), fields(receipt_number = receipt.receipt_number, house_id = ?receipt.house_id))]
    async fn create_receipt(&self, receipt: NewReceipt) -> Result<ReceiptIssued, SalesError> {
        let mut tx = self.begin().await?;
        let issued = linkage::create_receipt_with_contract(&mut *tx, receipt).await?;
        tx.commit().await?;
        Ok(issued)
    }

    #[instrument(skip(self))]
    async fn delete_receipt(&self, id: ReceiptId) -> Result<ReceiptRemoval, SalesError> {
        let mut tx = self.begin().await?;
        let removal = linkage::delete_receipt_and_linked_contract(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(removal)
    }

    // ------------------------------------------------------------------
    // Contracts
    // ------------------------------------------------------------------

    #[instrument(skip(self))]
    async fn list_contracts(&self) -> Result<Vec<Contract>, SalesError> {
        let mut tx = self.begin().await?;
        let contracts = tx.contracts().await?;
        tx.commit().await?;
        Ok(contracts)
    }

    #[instrument(skip(self))]
    async fn get_contract(&self, id: ContractId) -> Result<Contract, SalesError> {
        let mut tx = self.begin().await?;
        let contract = tx.contract(id).await?.ok_or_else(|| SalesError::not_found("Contract", id))?;
        tx.commit().await?;
        Ok(contract)
    }

    #[instrument(skip(self, contract), fields(house_number = contract.house_number))]
    async fn create_contract(&self, mut contract: NewContract) -> Result<Contract, SalesError> {
        let mut tx = self.begin().await?;
        let mut checks = FieldChecks::default();
        checks.merge(contract.validate_all());
        match contract.contract_number {
            Some(number) => {
                if tx.contract_by_number(number).await?.is_some() {
                    checks.fail("contract_number", format!("contract number {number} already exists"));
                }
            }
            None => contract.contract_number = Some(tx.next_contract_number().await?),
        }
        checks.finish()?;

        let house = linkable_house(&mut *tx, contract.house_number).await?;
        if let Some(h) = &house {
            mark_sold(&mut *tx, h).await?;
        }
        let links = ContractLinks {
            house_id: house.as_ref().map(|h| h.id),
            receipt_id: None,
        };
        let created = tx.insert_contract(&contract, links).await?;
        tx.commit().await?;
        info!(contract_id = %created.id, contract_number = created.contract_number, "Contract created");
        Ok(created)
    }

    #[instrument(skip(self, contract))]
    async fn update_contract(&self, id: ContractId, mut contract: NewContract) -> Result<Contract, SalesError> {
        let mut tx = self.begin().await?;
        let existing = tx.contract(id).await?.ok_or_else(|| SalesError::not_found("Contract", id))?;

        let mut checks = FieldChecks::default();
        checks.merge(contract.validate_all());
        match contract.contract_number {
            Some(number) if number != existing.contract_number => {
                if tx.contract_by_number(number).await?.is_some() {
                    checks.fail("contract_number", format!("contract number {number} already exists"));
                }
            }
            Some(_) => {}
            None => contract.contract_number = Some(existing.contract_number),
        }
        checks.finish()?;

        // The paid total only moves through payments
        contract.amount_paid = existing.amount_paid;

        let house = linkable_house(&mut *tx, contract.house_number).await?;
        let links = ContractLinks {
            house_id: house.as_ref().map(|h| h.id),
            receipt_id: existing.receipt_id,
        };
        let updated = tx.update_contract(id, &contract, links).await?;

        if let Some(h) = &house {
            mark_sold(&mut *tx, h).await?;
        }
        if let Some(previous) = existing.house_id {
            if Some(previous) != links.house_id {
                linkage::release_house_if_unreferenced(&mut *tx, previous).await?;
            }
        }

        tx.commit().await?;
        info!(contract_id = %id, "Contract updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn delete_contract(&self, id: ContractId) -> Result<(), SalesError> {
        let mut tx = self.begin().await?;
        let contract = tx.contract(id).await?.ok_or_else(|| SalesError::not_found("Contract", id))?;

        if let Some(receipt_id) = contract.receipt_id {
            if tx.receipt(receipt_id).await?.is_some() {
                tx.link_receipt(receipt_id, None).await?;
            }
        }
        let payments_removed = tx.delete_payments_for_contract(id).await?;
        tx.delete_contract(id).await?;
        if let Some(house_id) = contract.house_id {
            linkage::release_house_if_unreferenced(&mut *tx, house_id).await?;
        }

        tx.commit().await?;
        info!(contract_id = %id, payments_removed, "Contract deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remaining_amount(&self, id: ContractId) -> Result<Money, SalesError> {
        let mut tx = self.begin().await?;
        let remaining = balance::remaining_amount(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(remaining)
    }

    #[instrument(skip(self))]
    async fn sold_houses(&self) -> Result<Vec<SoldHouse>, SalesError> {
        let mut tx = self.begin().await?;
        let mut contracts = tx.contracts().await?;
        contracts.sort_by(|a, b| b.contract_date.cmp(&a.contract_date).then(b.id.cmp(&a.id)));

        let mut seen = HashSet::new();
        let mut sold = Vec::new();
        for contract in contracts {
            let Some(house_id) = contract.house_id else { continue };
            if !seen.insert(house_id) {
                continue;
            }
            if let Some(house) = tx.house(house_id).await? {
                sold.push(SoldHouse {
                    house,
                    buyer_name: contract.buyer_name,
                    contract_date: contract.contract_date,
                    contract_number: contract.contract_number,
                });
            }
        }
        tx.commit().await?;
        Ok(sold)
    }

    // ------------------------------------------------------------------
    // Payments
    // ------------------------------------------------------------------

    #[instrument(skip(self))]
    async fn payments_for_contract(&self, contract_id: ContractId) -> Result<Vec<Payment>, SalesError> {
        let mut tx = self.begin().await?;
        let payments = tx.payments_for_contract(contract_id).await?;
        tx.commit().await?;
        Ok(payments)
    }

    #[instrument(skip(self, payment), fields(contract_id = %payment.contract_id))]
    async fn add_payment(&self, payment: NewPayment) -> Result<Payment, SalesError> {
        let mut tx = self.begin().await?;
        let stored = balance::add_payment(&mut *tx, payment).await?;
        tx.commit().await?;
        Ok(stored)
    }

    #[instrument(skip(self))]
    async fn delete_payment(&self, id: PaymentId) -> Result<Payment, SalesError> {
        let mut tx = self.begin().await?;
        let removed = balance::delete_payment(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Resale listings
    // ------------------------------------------------------------------

    #[instrument(skip(self))]
    async fn list_resale(&self) -> Result<Vec<ResaleView>, SalesError> {
        let mut tx = self.begin().await?;
        let listings = tx.resale_listings().await?;
        let mut views = Vec::with_capacity(listings.len());
        for listing in listings {
            let house = tx.house(listing.house_id).await?;
            let contracts = tx.contracts_for_house(listing.house_id).await?;
            views.push(ResaleView::assemble(listing, house.as_ref(), latest_contract(&contracts)));
        }
        tx.commit().await?;
        Ok(views)
    }

    #[instrument(skip(self, listing), fields(house_id = %listing.house_id))]
    async fn create_resale(&self, listing: NewResaleListing) -> Result<ResaleView, SalesError> {
        let mut tx = self.begin().await?;
        let house = tx.house(listing.house_id).await?;
        listing.validate_against(house.as_ref())?;

        let stored = tx.insert_resale(&listing).await?;
        let contracts = tx.contracts_for_house(listing.house_id).await?;
        tx.commit().await?;
        info!(resale_id = %stored.id, "Resale listing created");
        Ok(ResaleView::assemble(stored, house.as_ref(), latest_contract(&contracts)))
    }

    #[instrument(skip(self))]
    async fn delete_resale(&self, id: ResaleId) -> Result<(), SalesError> {
        let mut tx = self.begin().await?;
        tx.resale_listing(id)
            .await?
            .ok_or_else(|| SalesError::not_found("ResaleListing", id))?;
        tx.delete_resale(id).await?;
        tx.commit().await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Analytics
    // ------------------------------------------------------------------

    #[instrument(skip(self))]
    async fn statistics(&self) -> Result<SalesStatistics, SalesError> {
        let mut tx = self.begin().await?;
        let contracts = tx.contracts().await?;

        let referenced: HashSet<HouseId> = contracts.iter().filter_map(|c| c.house_id).collect();
        let mut houses = Vec::with_capacity(referenced.len());
        for house_id in referenced {
            if let Some(house) = tx.house(house_id).await? {
                houses.push(house);
            }
        }
        tx.commit().await?;

        statistics::aggregate(&contracts, &houses, self.clock.today())
            .map_err(|e| SalesError::Storage(core_kernel::PortError::internal(e.to_string())))
    }
}
