//! API error handling

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use core_kernel::{ContractId, PortError, ReceiptId};
use domain_sales::{FieldError, SalesError, ValidationErrors};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Receipt {receipt_id} matches several contracts")]
    Ambiguous {
        receipt_id: ReceiptId,
        candidates: Vec<ContractId>,
    },

    /// A write collided with existing data
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The store is temporarily unreachable
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_id: Option<ReceiptId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<ContractId>,
}

impl ErrorResponse {
    fn new(error: &str, message: String) -> Self {
        Self {
            error: error.to_string(),
            message,
            entity: None,
            id: None,
            fields: Vec::new(),
            receipt_id: None,
            candidates: Vec::new(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, body) = match self {
            ApiError::NotFound { entity, id } => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    entity: Some(entity),
                    id: Some(id),
                    ..ErrorResponse::new("not_found", message)
                },
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::new("bad_request", msg)),
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse {
                    fields: errors.fields().to_vec(),
                    ..ErrorResponse::new("validation_error", errors.to_string())
                },
            ),
            ApiError::Ambiguous { receipt_id, candidates } => (
                StatusCode::CONFLICT,
                ErrorResponse {
                    receipt_id: Some(receipt_id),
                    candidates,
                    ..ErrorResponse::new("linkage_ambiguity", message)
                },
            ),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, ErrorResponse::new("conflict", msg)),
            ApiError::Unavailable(msg) => {
                error!(error = %msg, "Store unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse::new("unavailable", "The record store is temporarily unavailable".to_string()),
                )
            }
            ApiError::Internal(msg) => {
                error!(error = %msg, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("internal_error", "Internal server error".to_string()),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<SalesError> for ApiError {
    fn from(err: SalesError) -> Self {
        match err {
            SalesError::Validation(errors) => ApiError::Validation(errors),
            SalesError::NotFound { entity, id } => ApiError::NotFound { entity, id },
            SalesError::LinkageAmbiguity { receipt_id, candidates } => {
                ApiError::Ambiguous { receipt_id, candidates }
            }
            SalesError::Storage(port) => port.into(),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        match err {
            e @ (PortError::Timeout { .. } | PortError::Connection { .. }) => ApiError::Unavailable(e.to_string()),
            PortError::Conflict { message } => ApiError::Conflict(message),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(ValidationErrors::single("body", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_is_unprocessable() {
        let err: ApiError = SalesError::invalid("buyer_name", "is required").into();
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_ambiguity_is_conflict() {
        let err: ApiError = SalesError::LinkageAmbiguity {
            receipt_id: ReceiptId::new(1),
            candidates: vec![ContractId::new(2), ContractId::new(3)],
        }
        .into();
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_transient_storage_is_unavailable() {
        let err: ApiError = SalesError::Storage(PortError::connection("refused")).into();
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_remote_failure_is_internal() {
        let err: ApiError = SalesError::Storage(PortError::Remote {
            status: 500,
            message: "boom".to_string(),
        })
        .into();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
