//! Progress Routes
//!
//! - GET /api/v1/progress - Progress photo log, upload order
//! - POST /api/v1/progress - Log a photo with today's weight
//! - DELETE /api/v1/progress/:reference - Remove a photo entry

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{DeleteProgressResponse, LogProgressRequest, ProgressListResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::ledger::ProgressEntry;

/// GET /api/v1/progress
pub async fn list_progress(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ProgressListResponse>> {
    let entries = state.ledger.lock().await.progress_log()?;
    let count = entries.len();
    Ok(Json(ProgressListResponse { entries, count }))
}

/// POST /api/v1/progress
///
/// The photo itself is stored by the caller; only its reference is logged.
pub async fn log_progress(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LogProgressRequest>,
) -> ApiResult<(StatusCode, Json<ProgressEntry>)> {
    let entry = state
        .ledger
        .lock()
        .await
        .log_progress(&req.reference, &req.weight)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// DELETE /api/v1/progress/:reference
///
/// Deleting an unknown reference is not an error; `deleted` is false.
pub async fn delete_progress(
    State(state): State<Arc<AppState>>,
    Path(reference): Path<String>,
) -> ApiResult<Json<DeleteProgressResponse>> {
    let deleted = state.ledger.lock().await.delete_progress(&reference)?;
    Ok(Json(DeleteProgressResponse { reference, deleted }))
}
