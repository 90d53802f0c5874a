//! Resale listing handlers

use axum::{extract::State, http::StatusCode, Json};
use core_kernel::ResaleId;
use domain_sales::resale::{ResaleDraft, ResaleView};

use crate::error::ApiError;
use crate::extract::{AppJson, AppPath};
use crate::AppState;

pub async fn list_resale(State(state): State<AppState>) -> Result<Json<Vec<ResaleView>>, ApiError> {
    Ok(Json(state.port.list_resale().await?))
}

pub async fn create_resale(
    State(state): State<AppState>,
    AppJson(draft): AppJson<ResaleDraft>,
) -> Result<(StatusCode, Json<ResaleView>), ApiError> {
    let view = state.port.create_resale(draft.into_input()?).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn delete_resale(
    State(state): State<AppState>,
    AppPath(id): AppPath<ResaleId>,
) -> Result<StatusCode, ApiError> {
    state.port.delete_resale(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
