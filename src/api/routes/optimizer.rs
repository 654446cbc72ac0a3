//! Optimizer Routes
//!
//! - POST /api/v1/optimizer - Exact portions of three foods for macro targets

use axum::Json;

use crate::analytics::plan_portions;
use crate::api::dto::{OptimizerRequest, OptimizerResponse};
use crate::api::error::ApiResult;

/// POST /api/v1/optimizer
///
/// Pure computation; the ledger is not involved. Singular and infeasible
/// systems are successful responses with their own `outcome`.
pub async fn optimize(Json(req): Json<OptimizerRequest>) -> ApiResult<Json<OptimizerResponse>> {
    let plan = plan_portions(&req.targets, &req.foods)?;
    Ok(Json(OptimizerResponse {
        summary: plan.summary(),
        plan,
    }))
}
