//! Debt listing DTOs

use serde::Deserialize;

/// Query of `GET /api/debts`
#[derive(Debug, Default, Deserialize)]
pub struct DebtQuery {
    /// Buyer name, mobile or house number fragment; blank lists overdue contracts
    #[serde(default)]
    pub search: Option<String>,
}

impl DebtQuery {
    pub fn term(&self) -> &str {
        self.search.as_deref().unwrap_or("")
    }
}
