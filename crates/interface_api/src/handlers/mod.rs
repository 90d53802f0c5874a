//! Request handlers, one module per resource

pub mod contracts;
pub mod database;
pub mod debts;
pub mod health;
pub mod houses;
pub mod payments;
pub mod receipts;
pub mod resale;
pub mod statistics;
