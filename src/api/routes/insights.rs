//! Insight Routes
//!
//! Analytics derived from the ledger on every request.
//!
//! - GET /api/v1/history/weekly - Seven-day intake series
//! - GET /api/v1/insights/correlations - Lifestyle correlation report
//! - GET /api/v1/insights/forecast - Weight trend and projection

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::analytics::{CorrelationReport, ForecastOutcome, InsightEngine};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::ledger::WeeklyHistory;

/// GET /api/v1/history/weekly
pub async fn weekly_history(State(state): State<Arc<AppState>>) -> ApiResult<Json<WeeklyHistory>> {
    let mut ledger = state.ledger.lock().await;
    Ok(Json(InsightEngine::new(&mut ledger).weekly_history()?))
}

/// GET /api/v1/insights/correlations
///
/// `status: "gathering"` until at least four days have been logged.
pub async fn correlations(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<CorrelationReport>> {
    let mut ledger = state.ledger.lock().await;
    Ok(Json(InsightEngine::new(&mut ledger).lifestyle_insights()?))
}

/// GET /api/v1/insights/forecast
///
/// `status: "insufficient_data"` until two weights can be parsed.
pub async fn forecast(State(state): State<Arc<AppState>>) -> ApiResult<Json<ForecastOutcome>> {
    let mut ledger = state.ledger.lock().await;
    Ok(Json(InsightEngine::new(&mut ledger).weight_forecast()?))
}
