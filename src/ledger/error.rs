//! Ledger error types
//!
//! Defines all errors that can occur while mutating or persisting the ledger.

use thiserror::Error;

/// Errors that can occur in the health ledger
#[derive(Error, Debug)]
pub enum LedgerError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Caller supplied a value the ledger refuses to record
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

/// Result type alias for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
