//! Health check handler

use axum::{extract::State, http::StatusCode, Json};

use crate::dto::health::HealthResponse;
use crate::AppState;

/// Reports the server version and the health of the record store
///
/// Answers 503 when the store is unreachable.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let store = state.port.health_check().await;
    let (status, label) = if store.is_healthy() {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            store,
        }),
    )
}
