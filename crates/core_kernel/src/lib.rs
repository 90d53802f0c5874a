//! Core Kernel - Foundational types for the sales ledger
//!
//! This crate provides the building blocks shared by the domain, storage and
//! API crates:
//! - Money with precise decimal arithmetic
//! - Typed integer identifiers for the five record collections
//! - Clock abstraction and calendar helpers
//! - Port error and health types for the storage adapters

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod ports;
pub mod registry;

pub use money::{Money, MoneyError};
pub use temporal::{Clock, FixedClock, SystemClock, Timezone, YearMonth};
pub use identifiers::{HouseId, ReceiptId, ContractId, PaymentId, ResaleId};
pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth, AdapterType};
pub use registry::{StoreSource, EmbeddedConfig, RemoteConfig};
