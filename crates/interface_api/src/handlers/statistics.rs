//! Statistics handler

use axum::{extract::State, Json};
use domain_sales::statistics::SalesStatistics;

use crate::error::ApiError;
use crate::AppState;

pub async fn statistics(State(state): State<AppState>) -> Result<Json<SalesStatistics>, ApiError> {
    Ok(Json(state.port.statistics().await?))
}
