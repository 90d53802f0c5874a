//! Adapters implementing [`SalesPort`](crate::ports::SalesPort) against
//! systems outside this process
//!
//! The embedded database store lives in `infra_db`; the only adapter here
//! talks to a remote ledger backend so that several workstations can share
//! one set of records.

pub mod remote_api;

pub use remote_api::RemoteSalesAdapter;
