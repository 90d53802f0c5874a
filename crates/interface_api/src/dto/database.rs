//! Database transfer DTOs

use infra_db::ImportSummary;
use serde::{Deserialize, Serialize};

/// Rows taken over from an imported file, per collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub houses: u64,
    pub receipts: u64,
    pub contracts: u64,
    pub payments: u64,
    pub resale: u64,
}

impl From<ImportSummary> for ImportReport {
    fn from(summary: ImportSummary) -> Self {
        Self {
            houses: summary.houses,
            receipts: summary.receipts,
            contracts: summary.contracts,
            payments: summary.payments,
            resale: summary.resale,
        }
    }
}
