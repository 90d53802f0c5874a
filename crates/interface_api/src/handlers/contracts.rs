//! Contract handlers

use axum::{extract::State, http::StatusCode, Json};
use core_kernel::ContractId;
use domain_sales::contract::{Contract, ContractDraft, RemainingBalance};
use domain_sales::house::SoldHouse;
use domain_sales::payment::Payment;

use crate::error::ApiError;
use crate::extract::{AppJson, AppPath};
use crate::AppState;

pub async fn list_contracts(State(state): State<AppState>) -> Result<Json<Vec<Contract>>, ApiError> {
    Ok(Json(state.port.list_contracts().await?))
}

pub async fn get_contract(
    State(state): State<AppState>,
    AppPath(id): AppPath<ContractId>,
) -> Result<Json<Contract>, ApiError> {
    Ok(Json(state.port.get_contract(id).await?))
}

pub async fn create_contract(
    State(state): State<AppState>,
    AppJson(draft): AppJson<ContractDraft>,
) -> Result<(StatusCode, Json<Contract>), ApiError> {
    let contract = state.port.create_contract(draft.into_input()?).await?;
    Ok((StatusCode::CREATED, Json(contract)))
}

pub async fn update_contract(
    State(state): State<AppState>,
    AppPath(id): AppPath<ContractId>,
    AppJson(draft): AppJson<ContractDraft>,
) -> Result<Json<Contract>, ApiError> {
    Ok(Json(state.port.update_contract(id, draft.into_input()?).await?))
}

pub async fn delete_contract(
    State(state): State<AppState>,
    AppPath(id): AppPath<ContractId>,
) -> Result<StatusCode, ApiError> {
    state.port.delete_contract(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Outstanding balance of a contract
pub async fn remaining_amount(
    State(state): State<AppState>,
    AppPath(id): AppPath<ContractId>,
) -> Result<Json<RemainingBalance>, ApiError> {
    let remaining_amount = state.port.remaining_amount(id).await?;
    Ok(Json(RemainingBalance {
        contract_id: id,
        remaining_amount,
    }))
}

/// Houses referenced by contracts, with their latest buyer
pub async fn sold_houses(State(state): State<AppState>) -> Result<Json<Vec<SoldHouse>>, ApiError> {
    Ok(Json(state.port.sold_houses().await?))
}

/// Payments of a contract, newest first
pub async fn contract_payments(
    State(state): State<AppState>,
    AppPath(id): AppPath<ContractId>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    Ok(Json(state.port.payments_for_contract(id).await?))
}
