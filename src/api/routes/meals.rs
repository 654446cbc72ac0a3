//! Meal Routes
//!
//! - POST /api/v1/meals - Log a meal by hand
//! - POST /api/v1/meals/scan - Estimate a meal from a photo

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::{LogMealRequest, LogMealResponse, ScanMealRequest, ScanMealResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::routes::decode_image;
use crate::api::state::AppState;

/// POST /api/v1/meals
///
/// Adds calories and macros to today's totals. Values are truncated to
/// whole numbers; negative values are rejected.
pub async fn log_meal(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LogMealRequest>,
) -> ApiResult<(StatusCode, Json<LogMealResponse>)> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("meal name cannot be empty".to_string()));
    }

    let mut ledger = state.ledger.lock().await;
    ledger.log_meal(name, req.calories, req.protein, req.carbs, req.fats)?;
    let stats = ledger.stats()?;

    Ok((
        StatusCode::CREATED,
        Json(LogMealResponse {
            logged: name.to_string(),
            stats,
        }),
    ))
}

/// POST /api/v1/meals/scan
///
/// Sends the photo to the coach for an estimate. With `log: true` the
/// estimate is then logged as a separate ledger operation.
pub async fn scan_meal(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScanMealRequest>,
) -> ApiResult<Json<ScanMealResponse>> {
    let (image, mime_type) = decode_image(&req.image, req.mime_type.as_deref())?;

    // No ledger lock while the coach is thinking
    let estimate = state.coach.describe_meal(&image, &mime_type).await?;

    if !req.log {
        return Ok(Json(ScanMealResponse {
            estimate,
            logged: false,
            stats: None,
        }));
    }

    let mut ledger = state.ledger.lock().await;
    ledger.log_meal(
        &estimate.name,
        f64::from(estimate.calories),
        f64::from(estimate.protein),
        f64::from(estimate.carbs),
        f64::from(estimate.fats),
    )?;
    let stats = ledger.stats()?;

    Ok(Json(ScanMealResponse {
        estimate,
        logged: true,
        stats: Some(stats),
    }))
}
