//! Payment handlers

use axum::{extract::State, http::StatusCode, Json};
use core_kernel::PaymentId;
use domain_sales::payment::{Payment, PaymentDraft};

use crate::error::ApiError;
use crate::extract::{AppJson, AppPath};
use crate::AppState;

/// Records a payment and raises the contract's paid total
pub async fn add_payment(
    State(state): State<AppState>,
    AppJson(draft): AppJson<PaymentDraft>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    let payment = state.port.add_payment(draft.into_input()?).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// Deletes a payment and returns it
pub async fn delete_payment(
    State(state): State<AppState>,
    AppPath(id): AppPath<PaymentId>,
) -> Result<Json<Payment>, ApiError> {
    Ok(Json(state.port.delete_payment(id).await?))
}
