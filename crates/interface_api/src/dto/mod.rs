//! Request and response bodies that are not domain records
//!
//! Records travel as their domain types, which already carry the wire
//! field names.

pub mod database;
pub mod debts;
pub mod health;
