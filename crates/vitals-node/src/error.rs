//! Error types for the orchestrator

use thiserror::Error;

/// Errors that can escalate out of the orchestrator.
///
/// Per-document failures never appear here: they are caught, logged, and
/// absorbed inside the phase loops. What remains is connection-level
/// change source trouble, ledger trouble at phase boundaries, and
/// configuration problems.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Configuration file missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Change source failure (fatal: no tailing without the log)
    #[error("Change source error: {0}")]
    Source(#[from] vitals_core::SourceError),

    /// Ledger failure outside a per-document write
    #[error("Ledger error: {0}")]
    Ledger(#[from] vitals_ledger::LedgerError),
}

/// Result type alias for orchestrator operations
pub type NodeResult<T> = Result<T, NodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_conversion() {
        let err: NodeError = vitals_core::SourceError::Connection("refused".to_string()).into();
        assert!(err.to_string().contains("refused"));
    }
}
