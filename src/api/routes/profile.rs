//! Profile Routes
//!
//! - GET /api/v1/profile - Current profile
//! - PUT /api/v1/profile - Replace the profile
//! - GET /api/v1/suggestions - Recommended foods for the current goal

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{SuggestionsResponse, UpdateProfileRequest};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::ledger::Profile;

/// GET /api/v1/profile
pub async fn get_profile(State(state): State<Arc<AppState>>) -> ApiResult<Json<Profile>> {
    let mut ledger = state.ledger.lock().await;
    Ok(Json(ledger.profile()?))
}

/// PUT /api/v1/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<Profile>> {
    let mut ledger = state.ledger.lock().await;
    ledger.update_profile(&req.name, &req.location, req.goal, &req.target_weight)?;
    Ok(Json(ledger.profile()?))
}

/// GET /api/v1/suggestions
pub async fn get_suggestions(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<SuggestionsResponse>> {
    let goal = state.ledger.lock().await.profile()?.goal;

    Ok(Json(SuggestionsResponse {
        goal,
        label: goal.label().to_string(),
        suggestions: goal.suggestions().iter().map(|s| s.to_string()).collect(),
    }))
}
