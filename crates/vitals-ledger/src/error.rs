//! Error types for the ledger

use thiserror::Error;

/// Errors that can occur in ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    /// I/O error while persisting or loading state
    #[error("Ledger I/O error: {0}")]
    Io(String),

    /// Error serializing the state for persistence
    #[error("Ledger serialization error: {0}")]
    Serialization(String),

    /// Persisted state could not be parsed
    #[error("Ledger deserialization error: {0}")]
    Deserialization(String),
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}
