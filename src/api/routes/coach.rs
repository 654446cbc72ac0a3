//! Coach Routes
//!
//! Text answers from the AI coach. Coach failures are returned as text in
//! `reply`, never as HTTP errors.
//!
//! - POST /api/v1/coach/chat - Chat with today's context
//! - POST /api/v1/coach/recipe - Local recipe for a food
//! - POST /api/v1/coach/pantry - Recipes from a pantry photo

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{ChatRequest, CoachReply, PantryRequest, RecipeRequest};
use crate::api::error::{ApiError, ApiResult};
use crate::api::routes::decode_image;
use crate::api::state::AppState;

/// POST /api/v1/coach/chat
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> ApiResult<Json<CoachReply>> {
    if req.message.trim().is_empty() {
        return Err(ApiError::Validation("message cannot be empty".to_string()));
    }

    let context = state.ledger.lock().await.coach_context()?;
    let reply = state.coach.chat(&req.message, &context).await;
    Ok(Json(CoachReply { reply }))
}

/// POST /api/v1/coach/recipe
pub async fn recipe(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RecipeRequest>,
) -> ApiResult<Json<CoachReply>> {
    if req.food.trim().is_empty() {
        return Err(ApiError::Validation("food cannot be empty".to_string()));
    }

    let profile = state.ledger.lock().await.profile()?;
    let reply = state
        .coach
        .recipe(&req.food, &profile.location, profile.goal.label())
        .await;
    Ok(Json(CoachReply { reply }))
}

/// POST /api/v1/coach/pantry
pub async fn pantry(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PantryRequest>,
) -> ApiResult<Json<CoachReply>> {
    let (image, mime_type) = decode_image(&req.image, req.mime_type.as_deref())?;

    let profile = state.ledger.lock().await.profile()?;
    let reply = state
        .coach
        .pantry(&image, &mime_type, &profile.location, profile.goal.label())
        .await;
    Ok(Json(CoachReply { reply }))
}
