//! Health DTOs

use core_kernel::HealthCheckResult;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store: HealthCheckResult,
}
