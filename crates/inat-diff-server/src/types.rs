//! Response types for the server endpoints

use serde::Serialize;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
