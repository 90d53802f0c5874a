//! Receipt handlers

use axum::{extract::State, http::StatusCode, Json};
use core_kernel::ReceiptId;
use domain_sales::receipt::{Receipt, ReceiptDraft, ReceiptIssued, ReceiptRemoval};

use crate::error::ApiError;
use crate::extract::{AppJson, AppPath};
use crate::AppState;

pub async fn list_receipts(State(state): State<AppState>) -> Result<Json<Vec<Receipt>>, ApiError> {
    Ok(Json(state.port.list_receipts().await?))
}

pub async fn get_receipt(
    State(state): State<AppState>,
    AppPath(id): AppPath<ReceiptId>,
) -> Result<Json<Receipt>, ApiError> {
    Ok(Json(state.port.get_receipt(id).await?))
}

/// Issues a receipt together with its contract
pub async fn create_receipt(
    State(state): State<AppState>,
    AppJson(draft): AppJson<ReceiptDraft>,
) -> Result<(StatusCode, Json<ReceiptIssued>), ApiError> {
    let issued = state.port.create_receipt(draft.into_input()?).await?;
    Ok((StatusCode::CREATED, Json(issued)))
}

/// Deletes a receipt, its contract and that contract's payments
pub async fn delete_receipt(
    State(state): State<AppState>,
    AppPath(id): AppPath<ReceiptId>,
) -> Result<Json<ReceiptRemoval>, ApiError> {
    Ok(Json(state.port.delete_receipt(id).await?))
}
