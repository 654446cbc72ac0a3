//! Nutrino Health Ledger
//!
//! This module owns the user's day-by-day nutrition and activity record:
//!
//! - **types**: Core data structures (DailyRecord, LedgerState, Goal, read models)
//! - **clock**: Wall-clock port so day boundaries are testable
//! - **store**: JSON document persistence with default-merging on load
//! - **engine**: `HealthLedger`, the only writer of `LedgerState`
//! - **error**: Error types
//!
//! # Architecture
//!
//! ```text
//! Write Path:
//!   Operation → Rollover check → Mutate copy → Save document → Swap in
//!
//! Read Path:
//!   Operation → Rollover check → Derive read model
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use nutrino::ledger::{HealthLedger, JsonFileStore, SystemClock};
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = JsonFileStore::new("./data/user_data.json");
//!     let mut ledger = HealthLedger::open(Box::new(store), Arc::new(SystemClock))?;
//!
//!     ledger.log_meal("Greek yogurt", 180.0, 17.0, 8.0, 9.0)?;
//!     let stats = ledger.stats()?;
//!     println!("{} kcal left today", stats.remaining);
//!
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod engine;
pub mod error;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{HealthLedger, CALORIES_PER_STEP, MAX_SYNC_STEPS, MIN_SYNC_STEPS, WEEK_DAYS};
pub use error::{LedgerError, LedgerResult};
pub use store::{merge_with_defaults, JsonFileStore, LedgerStore, MemoryStore};
pub use types::{
    ActivityDelta, DailyRecord, DailyStats, Goal, LedgerState, Profile, ProgressEntry,
    WeeklyHistory, DEFAULT_CALORIE_TARGET, DEFAULT_TARGET_WEIGHT, NEVER_SYNCED,
    PROGRESS_DATE_FORMAT, SHORT_DATE_FORMAT,
};
