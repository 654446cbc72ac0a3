//! Nutrino REST API
//!
//! HTTP API layer for Nutrino, built with Axum.
//!
//! # Endpoints
//!
//! ## Daily ledger
//! - `GET /api/v1/stats` - Today's totals
//! - `POST /api/v1/stats/reset` - Zero today's totals
//! - `POST /api/v1/meals` - Log a meal
//! - `POST /api/v1/meals/scan` - Estimate (and optionally log) a meal photo
//! - `POST /api/v1/activity/sync` - Wearable sync
//!
//! ## Profile & recovery
//! - `GET /api/v1/profile` - Current profile
//! - `PUT /api/v1/profile` - Update the profile
//! - `GET /api/v1/suggestions` - Foods for the current goal
//! - `PUT /api/v1/recovery` - Enter recovery mode
//! - `DELETE /api/v1/recovery` - Leave recovery mode
//! - `POST /api/v1/recovery/protocol` - Coach protocol for the active strain
//!
//! ## Progress
//! - `GET /api/v1/progress` - Progress photo log
//! - `POST /api/v1/progress` - Log a progress photo
//! - `DELETE /api/v1/progress/:reference` - Remove an entry
//!
//! ## Analytics
//! - `GET /api/v1/history/weekly` - Seven-day intake
//! - `GET /api/v1/insights/correlations` - Lifestyle correlations
//! - `GET /api/v1/insights/forecast` - Weight forecast
//! - `POST /api/v1/optimizer` - Macro portion planner
//!
//! ## Coach
//! - `POST /api/v1/coach/chat`
//! - `POST /api/v1/coach/recipe`
//! - `POST /api/v1/coach/pantry`
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use nutrino::api::{serve, AppState};
//! use nutrino::coach::{GeminiCoach, GeminiConfig};
//! use nutrino::config::ApiConfig;
//! use nutrino::ledger::{HealthLedger, JsonFileStore, SystemClock};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Box::new(JsonFileStore::new("nutrino_data.json"));
//!     let ledger = HealthLedger::open(store, Arc::new(SystemClock))?;
//!     let coach = Arc::new(GeminiCoach::new(GeminiConfig::default())?);
//!
//!     serve(AppState::new(ledger, coach, ApiConfig::default())).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ApiConfig;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Daily ledger routes
        .route("/stats", get(routes::stats::get_stats))
        .route("/stats/reset", post(routes::stats::reset_today))
        .route("/meals", post(routes::meals::log_meal))
        .route("/meals/scan", post(routes::meals::scan_meal))
        .route("/activity/sync", post(routes::activity::sync_activity))
        // Profile routes
        .route(
            "/profile",
            get(routes::profile::get_profile).put(routes::profile::update_profile),
        )
        .route("/suggestions", get(routes::profile::get_suggestions))
        // Recovery routes
        .route(
            "/recovery",
            delete(routes::recovery::clear_recovery).put(routes::recovery::set_recovery),
        )
        .route(
            "/recovery/protocol",
            post(routes::recovery::recovery_protocol),
        )
        // Progress routes
        .route(
            "/progress",
            get(routes::progress::list_progress).post(routes::progress::log_progress),
        )
        .route(
            "/progress/:reference",
            delete(routes::progress::delete_progress),
        )
        // Analytics routes
        .route("/history/weekly", get(routes::insights::weekly_history))
        .route(
            "/insights/correlations",
            get(routes::insights::correlations),
        )
        .route("/insights/forecast", get(routes::insights::forecast))
        .route("/optimizer", post(routes::optimizer::optimize))
        // Coach routes
        .route("/coach/chat", post(routes::coach::chat))
        .route("/coach/recipe", post(routes::coach::recipe))
        .route("/coach/pantry", post(routes::coach::pantry))
        // Photos arrive base64-encoded in JSON bodies
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config);
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Permissive CORS unless origins are configured
fn cors_layer(config: &ApiConfig) -> CorsLayer {
    if config.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the API server
pub async fn serve(state: AppState) -> Result<(), ApiError> {
    let addr = state.config.addr();
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Nutrino API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Nutrino API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coach::{Coach, CoachError, MealEstimate};
    use crate::ledger::{HealthLedger, ManualClock, MemoryStore};
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::NaiveDate;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    /// Coach that answers instantly and echoes its inputs
    struct ScriptedCoach {
        online: bool,
    }

    #[async_trait]
    impl Coach for ScriptedCoach {
        fn is_online(&self) -> bool {
            self.online
        }

        async fn describe_meal(
            &self,
            image: &[u8],
            _mime_type: &str,
        ) -> Result<MealEstimate, CoachError> {
            if image.is_empty() {
                return Err(CoachError::EmptyResponse);
            }
            Ok(MealEstimate {
                name: "Falafel Wrap".to_string(),
                calories: 520,
                protein: 18,
                carbs: 64,
                fats: 21,
                advice: "Add a side salad.".to_string(),
            })
        }

        async fn chat(&self, message: &str, context: &str) -> String {
            format!("{} | {}", context, message)
        }

        async fn recipe(&self, food: &str, location: &str, goal: &str) -> String {
            format!("{} in {} for {}", food, location, goal)
        }

        async fn pantry(&self, image: &[u8], _mime: &str, location: &str, _goal: &str) -> String {
            format!("{} bytes from {}", image.len(), location)
        }

        async fn recovery_protocol(&self, strain: &str, location: &str) -> String {
            format!("Protocol for {} ({})", strain, location)
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn create_test_app_with(online: bool) -> (Router, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::at_date(day(8)));
        let ledger = HealthLedger::open(Box::new(MemoryStore::new()), clock.clone()).unwrap();
        let coach = Arc::new(ScriptedCoach { online });
        let state = AppState::new(ledger, coach, ApiConfig::default());
        (build_router(state), clock)
    }

    fn create_test_app() -> (Router, Arc<ManualClock>) {
        create_test_app_with(true)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_health_probes() {
        let (app, _clock) = create_test_app();

        let (status, _) = send(&app, "GET", "/health/live", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, "GET", "/health/ready", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["coach"], "online");
    }

    #[tokio::test]
    async fn test_health_degraded_without_coach() {
        let (app, _clock) = create_test_app_with(false);

        let (_, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["ledger"], "ok");
    }

    #[tokio::test]
    async fn test_log_meal_updates_stats() {
        let (app, _clock) = create_test_app();

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/meals",
            Some(json!({"name": "Oats", "calories": 350.9, "protein": 12, "carbs": 60, "fats": 6})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["logged"], "Oats");
        assert_eq!(body["stats"]["consumed"], 350);

        let (status, body) = send(&app, "GET", "/api/v1/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["consumed"], 350);
        assert_eq!(body["remaining"], 2200 - 350);
        assert_eq!(body["date"], "2026-01-08");
    }

    #[tokio::test]
    async fn test_log_meal_rejects_bad_input() {
        let (app, _clock) = create_test_app();

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/meals",
            Some(json!({"name": "Ghost", "calories": -10})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/meals",
            Some(json!({"name": "Soup", "calories": "lots"})),
        )
        .await;
        assert!(status.is_client_error());

        let (_, body) = send(&app, "GET", "/api/v1/stats", None).await;
        assert_eq!(body["consumed"], 0);
    }

    #[tokio::test]
    async fn test_reset_and_sync() {
        let (app, _clock) = create_test_app();

        send(
            &app,
            "POST",
            "/api/v1/meals",
            Some(json!({"name": "Toast", "calories": 200})),
        )
        .await;

        let (status, body) = send(&app, "POST", "/api/v1/activity/sync", None).await;
        assert_eq!(status, StatusCode::OK);
        let steps = body["added"]["steps"].as_u64().unwrap();
        assert!((50..=500).contains(&steps));
        assert_eq!(body["stats"]["steps"], steps);
        assert_ne!(body["stats"]["last_sync"], "Never");

        let (_, body) = send(&app, "POST", "/api/v1/stats/reset", None).await;
        assert_eq!(body["consumed"], 0);
        assert_eq!(body["steps"], 0);
    }

    #[tokio::test]
    async fn test_scan_meal_logs_estimate() {
        let (app, _clock) = create_test_app();

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/meals/scan",
            Some(json!({"image": "data:image/png;base64,aGVsbG8=", "log": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["estimate"]["name"], "Falafel Wrap");
        assert_eq!(body["logged"], true);
        assert_eq!(body["stats"]["consumed"], 520);

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/meals/scan",
            Some(json!({"image": "aGVsbG8="})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["logged"], false);
        assert!(body.get("stats").is_none());
    }

    #[tokio::test]
    async fn test_scan_meal_rejects_invalid_image() {
        let (app, _clock) = create_test_app();

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/meals/scan",
            Some(json!({"image": "%%%"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_profile_and_suggestions() {
        let (app, _clock) = create_test_app();

        let (status, body) = send(
            &app,
            "PUT",
            "/api/v1/profile",
            Some(json!({"name": "Sam", "location": "Lisbon", "goal": "cut_sugar", "target_weight": "68.5"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Sam");
        assert_eq!(body["goal"], "cut_sugar");

        let (_, body) = send(&app, "GET", "/api/v1/suggestions", None).await;
        assert_eq!(body["goal"], "cut_sugar");
        assert_eq!(body["suggestions"].as_array().unwrap().len(), 3);

        let (status, _) = send(
            &app,
            "PUT",
            "/api/v1/profile",
            Some(json!({"name": "Sam", "location": "Lisbon", "goal": "cut_sugar", "target_weight": "heavy"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&app, "GET", "/api/v1/profile", None).await;
        assert_eq!(body["target_weight"], 68.5);
    }

    #[tokio::test]
    async fn test_recovery_flow() {
        let (app, _clock) = create_test_app();

        let (status, _) = send(&app, "POST", "/api/v1/recovery/protocol", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            "PUT",
            "/api/v1/recovery",
            Some(json!({"description": "  sprained ankle "})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recovery_mode"], true);
        assert_eq!(body["active_strain"], "sprained ankle");

        let (status, body) = send(&app, "POST", "/api/v1/recovery/protocol", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["strain"], "sprained ankle");
        assert!(body["protocol"].as_str().unwrap().starts_with("Protocol for sprained ankle"));

        let (_, body) = send(&app, "DELETE", "/api/v1/recovery", None).await;
        assert_eq!(body["recovery_mode"], false);
        assert_eq!(body["active_strain"], "");
    }

    #[tokio::test]
    async fn test_progress_and_forecast() {
        let (app, clock) = create_test_app();

        let (_, body) = send(&app, "GET", "/api/v1/insights/forecast", None).await;
        assert_eq!(body["status"], "insufficient_data");

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/progress",
            Some(json!({"reference": "week1.jpg", "weight": 80})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["date"], "Jan 08, 2026");
        assert_eq!(body["image"], "week1.jpg");

        clock.advance_days(7);
        send(
            &app,
            "POST",
            "/api/v1/progress",
            Some(json!({"reference": "week2.jpg", "weight": "79.3"})),
        )
        .await;

        let (_, body) = send(&app, "GET", "/api/v1/progress", None).await;
        assert_eq!(body["count"], 2);

        let (_, body) = send(&app, "GET", "/api/v1/insights/forecast", None).await;
        assert_eq!(body["status"], "ready");
        assert_eq!(body["trend"]["direction"], "losing");
        assert_eq!(body["projected"].as_array().unwrap().len(), 6);

        let (_, body) = send(&app, "DELETE", "/api/v1/progress/week1.jpg", None).await;
        assert_eq!(body["deleted"], true);
        let (_, body) = send(&app, "DELETE", "/api/v1/progress/week1.jpg", None).await;
        assert_eq!(body["deleted"], false);
    }

    #[tokio::test]
    async fn test_weekly_history_after_rollover() {
        let (app, clock) = create_test_app();

        send(
            &app,
            "POST",
            "/api/v1/meals",
            Some(json!({"name": "Pasta", "calories": 900})),
        )
        .await;
        clock.advance_days(1);

        let (_, body) = send(&app, "GET", "/api/v1/stats", None).await;
        assert_eq!(body["consumed"], 0);
        assert_eq!(body["date"], "2026-01-09");

        let (status, body) = send(&app, "GET", "/api/v1/history/weekly", None).await;
        assert_eq!(status, StatusCode::OK);
        let consumed = body["consumed"].as_array().unwrap();
        assert_eq!(consumed.len(), 7);
        assert_eq!(consumed[5], 900);
        assert_eq!(consumed[6], 0);
    }

    #[tokio::test]
    async fn test_correlations_gathering() {
        let (app, _clock) = create_test_app();

        let (status, body) = send(&app, "GET", "/api/v1/insights/correlations", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "gathering");
    }

    #[tokio::test]
    async fn test_optimizer_defaults() {
        let (app, _clock) = create_test_app();

        let (status, body) = send(&app, "POST", "/api/v1/optimizer", Some(json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "solved");
        assert_eq!(body["portions"].as_array().unwrap().len(), 3);

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/optimizer",
            Some(json!({
                "foods": [
                    {"name": "A", "protein": 10, "carbs": 10, "fats": 10},
                    {"name": "B", "protein": 20, "carbs": 20, "fats": 20},
                    {"name": "C", "protein": 1, "carbs": 2, "fats": 3}
                ]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "singular");
    }

    #[tokio::test]
    async fn test_coach_text_routes() {
        let (app, _clock) = create_test_app();

        send(
            &app,
            "PUT",
            "/api/v1/profile",
            Some(json!({"name": "Ana", "location": "Cairo", "goal": "eat_healthy", "target_weight": 60})),
        )
        .await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/coach/chat",
            Some(json!({"message": "Snack ideas?"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let reply = body["reply"].as_str().unwrap();
        assert!(reply.starts_with("User: Ana. Loc: Cairo."));
        assert!(reply.ends_with("Snack ideas?"));

        let (_, body) = send(
            &app,
            "POST",
            "/api/v1/coach/recipe",
            Some(json!({"food": "Lentils"})),
        )
        .await;
        assert_eq!(body["reply"], "Lentils in Cairo for Eat Healthy");

        let (_, body) = send(
            &app,
            "POST",
            "/api/v1/coach/pantry",
            Some(json!({"image": "aGVsbG8="})),
        )
        .await;
        assert_eq!(body["reply"], "5 bytes from Cairo");

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/coach/chat",
            Some(json!({"message": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
