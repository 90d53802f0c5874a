//! Sales domain errors

use core_kernel::{ContractId, PortError, ReceiptId};
use thiserror::Error;

use crate::validation::ValidationErrors;

/// Errors returned by the sales ledger operations
///
/// Validation, missing records and ambiguous links are expected outcomes
/// that callers render to the user. `Storage` wraps failures of the
/// underlying backend.
#[derive(Debug, Error)]
pub enum SalesError {
    /// One or more input fields are missing or malformed
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// The referenced record does not exist
    #[error("{entity} with id {id} not found")]
    NotFound {
        entity: &'static str,
        id: String,
    },

    /// Several contracts match a receipt that has no stored link
    #[error("Receipt {receipt_id} matches {} contracts: {}", .candidates.len(), join_ids(.candidates))]
    LinkageAmbiguity {
        receipt_id: ReceiptId,
        candidates: Vec<ContractId>,
    },

    /// The storage backend failed
    #[error("Storage error: {0}")]
    Storage(#[source] PortError),
}

fn join_ids(ids: &[ContractId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl SalesError {
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        SalesError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates a validation error for a single field
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        SalesError::Validation(ValidationErrors::single(field, message))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SalesError::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, SalesError::Validation(_))
    }
}

impl From<ValidationErrors> for SalesError {
    fn from(errors: ValidationErrors) -> Self {
        SalesError::Validation(errors)
    }
}

impl From<PortError> for SalesError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::NotFound { entity_type, id } => SalesError::NotFound {
                entity: entity_label(&entity_type),
                id,
            },
            other => SalesError::Storage(other),
        }
    }
}

pub(crate) fn entity_label(entity_type: &str) -> &'static str {
    match entity_type {
        "House" => "House",
        "Receipt" => "Receipt",
        "Contract" => "Contract",
        "Payment" => "Payment",
        "ResaleListing" => "ResaleListing",
        _ => "Record",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_not_found_maps_to_domain_not_found() {
        let err: SalesError = PortError::not_found("Contract", 4).into();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Contract with id 4 not found");
    }

    #[test]
    fn test_ambiguity_lists_candidates() {
        let err = SalesError::LinkageAmbiguity {
            receipt_id: ReceiptId::new(3),
            candidates: vec![ContractId::new(7), ContractId::new(9)],
        };
        assert_eq!(err.to_string(), "Receipt 3 matches 2 contracts: 7, 9");
    }

    #[test]
    fn test_other_port_errors_are_storage() {
        let err: SalesError = PortError::connection("refused").into();
        assert!(matches!(err, SalesError::Storage(_)));
    }
}
