//! Whole-database export and import
//!
//! Only an embedded store has a database file to hand out or replace; with
//! a remote backend both endpoints answer 400.

use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use core_kernel::PortError;
use infra_db::{DatabaseError, SqliteRecordStore};

use crate::dto::database::ImportReport;
use crate::error::ApiError;
use crate::AppState;

fn embedded_store(state: &AppState) -> Result<&SqliteRecordStore, ApiError> {
    state
        .store
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("database transfer needs the embedded store".to_string()))
}

/// Downloads a consistent copy of the database file
pub async fn export_database(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let bytes = embedded_store(&state)?
        .export_bytes()
        .await
        .map_err(PortError::from)?;
    let disposition = format!(
        "attachment; filename=\"realty-{}.db\"",
        Utc::now().format("%Y%m%d-%H%M%S")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/vnd.sqlite3".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

/// Replaces every record with the uploaded database file
pub async fn import_database(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ImportReport>, ApiError> {
    let summary = embedded_store(&state)?
        .import_bytes(&body)
        .await
        .map_err(|e| match e {
            e @ (DatabaseError::SnapshotFailed(_) | DatabaseError::CorruptValue { .. }) => {
                ApiError::BadRequest(e.to_string())
            }
            other => PortError::from(other).into(),
        })?;
    Ok(Json(summary.into()))
}
