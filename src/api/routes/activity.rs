//! Activity Routes
//!
//! - POST /api/v1/activity/sync - Pull steps from the wearable

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::SyncActivityResponse;
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// POST /api/v1/activity/sync
///
/// Adds a synthetic step count and the calories it burned to today.
pub async fn sync_activity(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<SyncActivityResponse>> {
    let mut ledger = state.ledger.lock().await;
    let added = ledger.sync_activity()?;
    let stats = ledger.stats()?;

    Ok(Json(SyncActivityResponse { added, stats }))
}
