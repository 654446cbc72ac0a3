//! # Nutrino
//!
//! Personal Nutrition Dashboard - a Rust service that keeps a daily health
//! ledger and turns it into actionable analytics.
//!
//! ## Features
//!
//! - **Daily ledger**: calories, macros and steps with automatic midnight rollover
//! - **Durability**: every change is written to a JSON document before it is visible
//! - **Portion planner**: exact grams of three foods for macro targets (Gauss-Jordan)
//! - **Lifestyle insights**: Pearson correlations over the logged history
//! - **Weight forecast**: least-squares trend with a 30-day projection
//! - **AI coach**: meal photo estimates, chat, recipes and recovery protocols
//!
//! ## Modules
//!
//! - [`ledger`]: Daily health ledger and its persistence
//! - [`analytics`]: Solver, correlations and forecasting
//! - [`coach`]: Generative-AI collaborator
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML configuration and logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nutrino::analytics::InsightEngine;
//! use nutrino::ledger::{HealthLedger, JsonFileStore, SystemClock};
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Box::new(JsonFileStore::new("nutrino_data.json"));
//!     let mut ledger = HealthLedger::open(store, Arc::new(SystemClock))?;
//!
//!     // Log a meal (kcal, protein, carbs, fats)
//!     ledger.log_meal("Oatmeal", 350.0, 12.0, 60.0, 6.0)?;
//!
//!     let stats = ledger.stats()?;
//!     println!("{} kcal left today", stats.remaining);
//!
//!     // Analytics over the persisted history
//!     let report = InsightEngine::new(&mut ledger).lifestyle_insights()?;
//!     println!("{:?}", report);
//!
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod api;
pub mod coach;
pub mod config;
pub mod ledger;

// Re-export top-level types for convenience
pub use ledger::{
    Clock, DailyRecord, DailyStats, Goal, HealthLedger, JsonFileStore, LedgerError,
    LedgerResult, LedgerState, LedgerStore, ProgressEntry, Profile, SystemClock, WeeklyHistory,
};

pub use analytics::{
    forecast_weight, lifestyle_insights, pearson_correlation, plan_portions,
    solve_gauss_jordan, AnalyticsError, CorrelationReport, FoodProfile, ForecastOutcome,
    InsightEngine, MacroTargets, PortionPlan,
};

pub use coach::{Coach, CoachError, GeminiCoach, GeminiConfig, MealEstimate};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{ApiConfig, CoachConfig, Config, ConfigError, LedgerConfig, LoggingConfig};
