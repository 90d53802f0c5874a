//! Sales Domain Ports
//!
//! Two layers of ports live here.
//!
//! - [`RecordStore`] / [`RecordTx`]: the storage port. A store hands out
//!   transactions; every read and write of one ledger operation goes
//!   through the same transaction, and nothing is visible to other readers
//!   until [`RecordTx::commit`] succeeds. Dropping a transaction without
//!   committing discards its writes.
//! - [`SalesPort`]: the application port used by the REST handlers and any
//!   other caller. It is implemented by
//!   [`LocalSalesService`](crate::services::LocalSalesService), which runs
//!   the engines over a `RecordStore`, and by
//!   [`RemoteSalesAdapter`](crate::adapters::remote_api::RemoteSalesAdapter),
//!   which forwards to a remote backend.
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_sales::ports::SalesPort;
//! use std::sync::Arc;
//!
//! let port: Arc<dyn SalesPort> = match source {
//!     StoreSource::Embedded(cfg) => Arc::new(LocalSalesService::new(store, clock)),
//!     StoreSource::Remote(cfg) => Arc::new(RemoteSalesAdapter::new(cfg)?),
//! };
//! let issued = port.create_receipt(input).await?;
//! ```

use async_trait::async_trait;

use core_kernel::{
    ContractId, DomainPort, HealthCheckable, HouseId, Money, PaymentId, PortError, ReceiptId,
    ResaleId,
};

use crate::contract::{Contract, ContractLinks, NewContract};
use crate::error::SalesError;
use crate::house::{BulkHouseReport, BulkHouses, House, HouseFilter, HouseStatus, NewHouse, SoldHouse};
use crate::payment::{NewPayment, Payment};
use crate::receipt::{NewReceipt, Receipt, ReceiptIssued, ReceiptRemoval};
use crate::resale::{NewResaleListing, ResaleListing, ResaleView};
use crate::statistics::SalesStatistics;

/// The five record collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Houses,
    Receipts,
    Contracts,
    Payments,
    Resale,
}

impl Collection {
    /// Table or resource name of the collection
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Houses => "houses",
            Collection::Receipts => "receipts",
            Collection::Contracts => "contracts",
            Collection::Payments => "payments",
            Collection::Resale => "resale",
        }
    }
}

/// Storage backend for the ledger records
#[async_trait]
pub trait RecordStore: DomainPort + HealthCheckable {
    /// Opens a transaction
    async fn begin(&self) -> Result<Box<dyn RecordTx>, PortError>;
}

/// One unit of work against the record store
///
/// Listing methods return records in the order the ledger displays them:
/// houses by house number, receipts newest first by date then number,
/// contracts by sale date descending, payments newest first, resale
/// listings by contact date descending.
#[async_trait]
pub trait RecordTx: Send {
    // Houses

    async fn houses(&mut self, filter: &HouseFilter) -> Result<Vec<House>, PortError>;
    async fn house(&mut self, id: HouseId) -> Result<Option<House>, PortError>;
    /// Looks up by business key, including soft-deleted houses
    async fn house_by_number(&mut self, house_number: i64) -> Result<Option<House>, PortError>;
    /// Highest house number ever used, soft-deleted houses included
    async fn max_house_number(&mut self) -> Result<Option<i64>, PortError>;
    async fn insert_house(&mut self, house: &NewHouse) -> Result<House, PortError>;
    async fn update_house(&mut self, id: HouseId, house: &NewHouse) -> Result<House, PortError>;
    async fn set_house_status(&mut self, id: HouseId, status: HouseStatus) -> Result<(), PortError>;

    // Receipts

    async fn receipts(&mut self) -> Result<Vec<Receipt>, PortError>;
    async fn receipt(&mut self, id: ReceiptId) -> Result<Option<Receipt>, PortError>;
    async fn receipt_by_number(&mut self, receipt_number: i64) -> Result<Option<Receipt>, PortError>;
    async fn insert_receipt(&mut self, receipt: &NewReceipt) -> Result<Receipt, PortError>;
    /// Stores (or clears) the pairing from a receipt to its contract
    async fn link_receipt(
        &mut self,
        id: ReceiptId,
        contract_id: Option<ContractId>,
    ) -> Result<(), PortError>;
    async fn delete_receipt(&mut self, id: ReceiptId) -> Result<(), PortError>;

    // Contracts

    async fn contracts(&mut self) -> Result<Vec<Contract>, PortError>;
    async fn contract(&mut self, id: ContractId) -> Result<Option<Contract>, PortError>;
    async fn contract_by_number(&mut self, contract_number: i64) -> Result<Option<Contract>, PortError>;
    async fn contracts_for_house(&mut self, house_id: HouseId) -> Result<Vec<Contract>, PortError>;
    /// `max(contract_number) + 1`, 1 when there are no contracts
    async fn next_contract_number(&mut self) -> Result<i64, PortError>;
    /// Inserts a contract; `contract.contract_number` must already be set
    async fn insert_contract(
        &mut self,
        contract: &NewContract,
        links: ContractLinks,
    ) -> Result<Contract, PortError>;
    async fn update_contract(
        &mut self,
        id: ContractId,
        contract: &NewContract,
        links: ContractLinks,
    ) -> Result<Contract, PortError>;
    async fn set_amount_paid(&mut self, id: ContractId, amount_paid: Money) -> Result<(), PortError>;
    async fn delete_contract(&mut self, id: ContractId) -> Result<(), PortError>;

    // Payments

    async fn payments_for_contract(&mut self, contract_id: ContractId) -> Result<Vec<Payment>, PortError>;
    async fn payment(&mut self, id: PaymentId) -> Result<Option<Payment>, PortError>;
    /// Inserts a payment; `payment_type` must already be defaulted
    async fn insert_payment(&mut self, payment: &NewPayment) -> Result<Payment, PortError>;
    async fn delete_payment(&mut self, id: PaymentId) -> Result<(), PortError>;
    /// Returns the number of payments removed
    async fn delete_payments_for_contract(&mut self, contract_id: ContractId) -> Result<u64, PortError>;

    // Resale listings

    async fn resale_listings(&mut self) -> Result<Vec<ResaleListing>, PortError>;
    async fn resale_listing(&mut self, id: ResaleId) -> Result<Option<ResaleListing>, PortError>;
    async fn insert_resale(&mut self, listing: &NewResaleListing) -> Result<ResaleListing, PortError>;
    async fn delete_resale(&mut self, id: ResaleId) -> Result<(), PortError>;

    /// Makes every write of this transaction durable and visible
    async fn commit(self: Box<Self>) -> Result<(), PortError>;
}

/// Application port for the sales ledger
///
/// Each method is one user-visible operation and either applies completely
/// or not at all.
#[async_trait]
pub trait SalesPort: DomainPort + HealthCheckable {
    // Houses

    async fn list_houses(&self, filter: HouseFilter) -> Result<Vec<House>, SalesError>;
    async fn get_house(&self, id: HouseId) -> Result<House, SalesError>;
    async fn create_house(&self, house: NewHouse) -> Result<House, SalesError>;
    /// Adds generated houses numbered consecutively after the highest number in use
    async fn create_houses_bulk(&self, request: BulkHouses) -> Result<BulkHouseReport, SalesError>;
    async fn update_house(&self, id: HouseId, house: NewHouse) -> Result<House, SalesError>;
    /// Soft delete; the house stays resolvable for historical contracts
    async fn delete_house(&self, id: HouseId) -> Result<(), SalesError>;

    // Receipts

    async fn list_receipts(&self) -> Result<Vec<Receipt>, SalesError>;
    async fn get_receipt(&self, id: ReceiptId) -> Result<Receipt, SalesError>;
    /// Issues a receipt, marks its house sold and synthesizes the contract
    async fn create_receipt(&self, receipt: NewReceipt) -> Result<ReceiptIssued, SalesError>;
    /// Deletes a receipt together with its contract and that contract's payments
    async fn delete_receipt(&self, id: ReceiptId) -> Result<ReceiptRemoval, SalesError>;

    // Contracts

    async fn list_contracts(&self) -> Result<Vec<Contract>, SalesError>;
    async fn get_contract(&self, id: ContractId) -> Result<Contract, SalesError>;
    async fn create_contract(&self, contract: NewContract) -> Result<Contract, SalesError>;
    async fn update_contract(&self, id: ContractId, contract: NewContract) -> Result<Contract, SalesError>;
    async fn delete_contract(&self, id: ContractId) -> Result<(), SalesError>;
    async fn remaining_amount(&self, id: ContractId) -> Result<Money, SalesError>;
    async fn sold_houses(&self) -> Result<Vec<SoldHouse>, SalesError>;

    // Payments

    async fn payments_for_contract(&self, contract_id: ContractId) -> Result<Vec<Payment>, SalesError>;
    async fn add_payment(&self, payment: NewPayment) -> Result<Payment, SalesError>;
    /// Deletes a payment and returns it
    async fn delete_payment(&self, id: PaymentId) -> Result<Payment, SalesError>;

    // Resale listings

    async fn list_resale(&self) -> Result<Vec<ResaleView>, SalesError>;
    async fn create_resale(&self, listing: NewResaleListing) -> Result<ResaleView, SalesError>;
    async fn delete_resale(&self, id: ResaleId) -> Result<(), SalesError>;

    // Analytics

    async fn statistics(&self) -> Result<SalesStatistics, SalesError>;
}
