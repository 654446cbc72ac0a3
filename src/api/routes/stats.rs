//! Daily Stats Routes
//!
//! - GET /api/v1/stats - Today's totals and remaining calories
//! - POST /api/v1/stats/reset - Zero today's totals

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::ledger::DailyStats;

/// GET /api/v1/stats
pub async fn get_stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<DailyStats>> {
    let mut ledger = state.ledger.lock().await;
    Ok(Json(ledger.stats()?))
}

/// POST /api/v1/stats/reset
///
/// Zeroes today's accumulators. History is left untouched.
pub async fn reset_today(State(state): State<Arc<AppState>>) -> ApiResult<Json<DailyStats>> {
    let mut ledger = state.ledger.lock().await;
    ledger.reset_today()?;
    Ok(Json(ledger.stats()?))
}
