//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (ledger readable)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
///
/// Kubernetes liveness probe.
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Kubernetes readiness probe.
/// Returns 200 once the ledger can be read (this also runs the day rollover).
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    if check_ledger_health(&state).await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health
///
/// Full health status with component details. An offline coach only
/// degrades the service; the ledger and analytics keep working.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let ledger_ok = check_ledger_health(&state).await;
    let coach_online = state.coach.is_online();

    let status = match (ledger_ok, coach_online) {
        (true, true) => "healthy",
        (true, false) => "degraded",
        (false, _) => "unhealthy",
    };

    Json(HealthResponse {
        status: status.to_string(),
        ledger: if ledger_ok { "ok" } else { "error" }.to_string(),
        coach: if coach_online { "online" } else { "offline" }.to_string(),
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn check_ledger_health(state: &AppState) -> bool {
    let mut ledger = state.ledger.lock().await;
    match ledger.snapshot() {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Ledger health check failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness() {
        let status = liveness().await;
        assert_eq!(status, StatusCode::OK);
    }
}
