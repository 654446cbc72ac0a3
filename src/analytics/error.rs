//! Analytics error types
//!
//! Degenerate math (singular systems, constant series, too few samples) is
//! never an error here; it is reported through outcome types. Only inputs the
//! caller should have rejected end up as an `AnalyticsError`.

use crate::ledger::LedgerError;
use thiserror::Error;

/// Errors that can occur in the analytics layer
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// A numeric input was NaN or infinite
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Reading the ledger failed
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Result type alias for analytics operations
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
