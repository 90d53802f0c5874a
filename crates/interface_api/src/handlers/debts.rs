//! Debt handlers

use axum::{extract::State, Json};
use domain_sales::overdue::DebtAssessment;

use crate::dto::debts::DebtQuery;
use crate::error::ApiError;
use crate::extract::AppQuery;
use crate::AppState;

/// Overdue contracts, or the contracts matching `search`
pub async fn list_debts(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<DebtQuery>,
) -> Result<Json<Vec<DebtAssessment>>, ApiError> {
    let debts = state.debts.search_overdue_contracts(query.term()).await?;
    Ok(Json(debts))
}
