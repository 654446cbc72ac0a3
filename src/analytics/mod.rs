//! Nutrino Analytics
//!
//! Pure numeric engines plus a facade that feeds them from the ledger.
//!
//! ## Architecture
//!
//! - **solver**: Gauss-Jordan 3×3 solver and the macro portion planner
//! - **correlations**: Pearson coefficient and lifestyle insight rules
//! - **forecast**: OLS weight trend and 30-day projection
//! - **insights**: `InsightEngine`, the ledger-backed facade
//!
//! The solver has no ledger dependency; it is called with ad-hoc inputs.

mod correlations;
mod error;
mod forecast;
mod insights;
mod solver;

pub use correlations::{
    lifestyle_insights, pearson_correlation, CorrelationReport, Insight, InsightKind,
    ACTIVE_APPETITE_THRESHOLD, CARB_COMA_THRESHOLD, HIGH_ENERGY_THRESHOLD, MIN_ACTIVE_DAYS,
    SATIETY_THRESHOLD,
};
pub use error::{AnalyticsError, AnalyticsResult};
pub use forecast::{
    forecast_weight, weight_samples, ForecastOutcome, TrendDirection, TrendLine, TrendPoint,
    WeightForecast, PROJECTION_HORIZON_DAYS, PROJECTION_STEP_DAYS, STABLE_SLOPE,
};
pub use insights::InsightEngine;
pub use solver::{
    plan_portions, solve_gauss_jordan, FoodProfile, MacroTargets, Portion, PortionPlan,
};
