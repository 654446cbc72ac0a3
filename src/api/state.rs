//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::coach::Coach;
use crate::config::ApiConfig;
use crate::ledger::HealthLedger;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// The ledger; each handler holds the lock for one ledger operation
    pub ledger: Arc<Mutex<HealthLedger>>,
    /// AI coach collaborator, called with no ledger lock held
    pub coach: Arc<dyn Coach>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(ledger: HealthLedger, coach: Arc<dyn Coach>, config: ApiConfig) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            coach,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
