//! Nutrino API Server
//!
//! Run with: cargo run --bin nutrino-api
//!
//! # Configuration
//!
//! Read from `config.toml` (see `nutrino config`), then environment variables:
//! - `NUTRINO_API_HOST`: Host to bind to (default: 127.0.0.1)
//! - `NUTRINO_API_PORT`: Port to listen on (default: 8085)
//! - `NUTRINO_DATA_DIR`: Directory holding the ledger document
//! - `NUTRINO_LEDGER_FILE`: Ledger document name (default: user_data.json)
//! - `GEMINI_API_KEY`: Enables the AI coach
//! - `NUTRINO_COACH_MODEL`: Gemini model name
//! - `NUTRINO_LOG_LEVEL` / `NUTRINO_LOG_FORMAT`: Logging (`RUST_LOG` wins when set)

use nutrino::api::{serve, AppState};
use nutrino::coach::{Coach, GeminiCoach};
use nutrino::config::Config;
use nutrino::ledger::{HealthLedger, JsonFileStore, SystemClock};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, config_errors) = Config::load_default();
    config.logging.init_tracing()?;
    for e in &config_errors {
        tracing::warn!("Skipping config file: {}", e);
    }

    tracing::info!("Starting Nutrino API server v{}", env!("CARGO_PKG_VERSION"));

    // Open the ledger
    let ledger_path = config.ledger.ledger_path();
    tracing::info!("Ledger document: {:?}", ledger_path);
    let ledger = HealthLedger::open(
        Box::new(JsonFileStore::new(ledger_path)),
        Arc::new(SystemClock),
    )?;

    // Coach runs offline without an API key
    let coach = GeminiCoach::new((&config.coach).into())?;
    if coach.is_online() {
        tracing::info!("AI coach enabled with model {}", config.coach.model);
    }

    let state = AppState::new(ledger, Arc::new(coach), config.api.clone());

    // Run server
    tracing::info!("Starting server on {}", config.api.addr());
    serve(state).await?;

    tracing::info!("Nutrino API server stopped");
    Ok(())
}
