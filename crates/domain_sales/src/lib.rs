//! Sales Ledger Domain
//!
//! Records the sale of houses in a housing project: the house inventory,
//! the receipts issued when a buyer pays, the contracts that track what
//! each buyer still owes, the installment payments against those contracts
//! and leads for reselling sold houses.
//!
//! # Engines
//!
//! - **Linkage** ([`linkage`]): issuing a receipt marks its house sold and
//!   synthesizes the paired contract; deleting the receipt removes that
//!   contract and its payments again.
//! - **Balance** ([`balance`]): keeps each contract's `amount_paid` in step
//!   with its payments.
//! - **Overdue** ([`overdue`]): derives next due dates and the debts view.
//! - **Statistics** ([`statistics`]): dashboard aggregates.
//!
//! # Examples
//!
//! ```rust
//! use domain_sales::contract::remaining_amount;
//! use core_kernel::Money;
//!
//! let remaining = remaining_amount(Money::from_units(100_000), Money::from_units(40_000));
//! assert_eq!(remaining, Money::from_units(60_000));
//!
//! // Overpaid contracts owe nothing
//! let settled = remaining_amount(Money::from_units(100_000), Money::from_units(120_000));
//! assert!(settled.is_zero());
//! ```

pub mod validation;
pub mod error;
pub mod house;
pub mod receipt;
pub mod contract;
pub mod payment;
pub mod resale;
pub mod ports;
pub mod linkage;
pub mod balance;
pub mod statistics;
pub mod overdue;
pub mod services;
pub mod adapters;

pub use error::SalesError;
pub use validation::{FieldError, Presence, ValidationErrors};
pub use house::{BulkHouseReport, BulkHouses, House, HouseDraft, HouseFilter, HouseStatus, NewHouse, SoldHouse};
pub use receipt::{NewReceipt, Receipt, ReceiptDraft, ReceiptIssued, ReceiptRemoval};
pub use contract::{Contract, ContractDraft, ContractLinks, NewContract, RemainingBalance, SignatureStatus};
pub use payment::{NewPayment, Payment, PaymentDraft};
pub use resale::{HouseSummary, NewResaleListing, ResaleDraft, ResaleListing, ResaleView};
pub use ports::{Collection, RecordStore, RecordTx, SalesPort};
pub use statistics::{MonthlySales, SalesStatistics};
pub use overdue::{DebtAssessment, DueDatePolicy, OverdueEngine, SearchScope};
pub use services::LocalSalesService;
pub use adapters::RemoteSalesAdapter;
