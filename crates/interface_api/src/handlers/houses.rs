//! House handlers

use axum::{extract::State, http::StatusCode, Json};
use core_kernel::HouseId;
use domain_sales::house::{BulkHouseReport, BulkHouses, House, HouseDraft, HouseFilter};

use crate::error::ApiError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::AppState;

/// Lists houses, optionally by phase or availability
pub async fn list_houses(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<HouseFilter>,
) -> Result<Json<Vec<House>>, ApiError> {
    Ok(Json(state.port.list_houses(filter).await?))
}

/// Gets a house by ID, in any status
pub async fn get_house(
    State(state): State<AppState>,
    AppPath(id): AppPath<HouseId>,
) -> Result<Json<House>, ApiError> {
    Ok(Json(state.port.get_house(id).await?))
}

pub async fn create_house(
    State(state): State<AppState>,
    AppJson(draft): AppJson<HouseDraft>,
) -> Result<(StatusCode, Json<House>), ApiError> {
    let house = state.port.create_house(draft.into_input()?).await?;
    Ok((StatusCode::CREATED, Json(house)))
}

/// Adds generated houses after the highest house number
pub async fn create_houses_bulk(
    State(state): State<AppState>,
    AppJson(request): AppJson<BulkHouses>,
) -> Result<(StatusCode, Json<BulkHouseReport>), ApiError> {
    let report = state.port.create_houses_bulk(request).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn update_house(
    State(state): State<AppState>,
    AppPath(id): AppPath<HouseId>,
    AppJson(draft): AppJson<HouseDraft>,
) -> Result<Json<House>, ApiError> {
    Ok(Json(state.port.update_house(id, draft.into_input()?).await?))
}

/// Soft-deletes a house
pub async fn delete_house(
    State(state): State<AppState>,
    AppPath(id): AppPath<HouseId>,
) -> Result<StatusCode, ApiError> {
    state.port.delete_house(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
