//! Recovery Routes
//!
//! - PUT /api/v1/recovery - Enter recovery mode for a strain
//! - DELETE /api/v1/recovery - Leave recovery mode
//! - POST /api/v1/recovery/protocol - Coach protocol for the active strain

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{RecoveryProtocolResponse, RecoveryRequest};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::ledger::DailyStats;

/// PUT /api/v1/recovery
///
/// An empty description is the same as leaving recovery mode.
pub async fn set_recovery(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RecoveryRequest>,
) -> ApiResult<Json<DailyStats>> {
    let mut ledger = state.ledger.lock().await;
    ledger.set_recovery_mode(&req.description)?;
    Ok(Json(ledger.stats()?))
}

/// DELETE /api/v1/recovery
pub async fn clear_recovery(State(state): State<Arc<AppState>>) -> ApiResult<Json<DailyStats>> {
    let mut ledger = state.ledger.lock().await;
    ledger.clear_recovery_mode()?;
    Ok(Json(ledger.stats()?))
}

/// POST /api/v1/recovery/protocol
pub async fn recovery_protocol(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<RecoveryProtocolResponse>> {
    let (strain, location) = {
        let mut ledger = state.ledger.lock().await;
        let snapshot = ledger.snapshot()?;
        if !snapshot.recovery_mode {
            return Err(ApiError::Validation(
                "recovery mode is not active".to_string(),
            ));
        }
        (snapshot.active_strain.clone(), snapshot.location.clone())
    };

    let protocol = state.coach.recovery_protocol(&strain, &location).await;
    Ok(Json(RecoveryProtocolResponse { strain, protocol }))
}
