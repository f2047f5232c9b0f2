//! `/health` endpoint.

use serde::Serialize;
use std::time::Instant;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server is running.
    pub status: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Number of served subsystems.
    pub routes: usize,
    /// Served subsystem names.
    pub subsystems: Vec<String>,
}

/// Build a health response.
pub fn health_check(start_time: Instant, subsystems: Vec<String>) -> HealthResponse {
    HealthResponse {
        status: "ok".into(),
        uptime_secs: start_time.elapsed().as_secs(),
        routes: subsystems.len(),
        subsystems,
    }
}
