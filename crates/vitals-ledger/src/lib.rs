//! # Vitals Ledger
//!
//! Durable, idempotent record of delivered documents plus the single log
//! cursor the tailing pass resumes from.
//!
//! The ledger is the idempotency gate of the whole pipeline: an entry for
//! a document id exists if and only if every event derived from that
//! document was durably accepted by the delivery sink. The cursor is an
//! independent write — the orchestrator tolerates a cursor write failing
//! after a successful ledger write, because re-observing a recorded
//! document on restart is a harmless skip.
//!
//! ## Implementations
//!
//! - [`MemoryLedger`]: in-memory, for tests and dry-runs
//! - [`FileLedger`]: single JSON snapshot file, persisted fully on every
//!   mutation, for production
//!
//! The store is injected into the orchestrator at construction, so the
//! idempotency property is testable without touching a filesystem.

pub mod error;
pub mod file;
pub mod memory;
pub mod state;

// Re-exports
pub use error::LedgerError;
pub use file::FileLedger;
pub use memory::MemoryLedger;
pub use state::{LedgerState, LedgerStats, SyncSummary};

use async_trait::async_trait;

use vitals_core::Position;

/// Durable record of delivered documents and the tailing cursor.
///
/// Every mutating call persists synchronously and fully before returning:
/// a crash immediately after a successful call never loses that update,
/// and a crash during a call loses at most that single update — which the
/// delivery sequence treats as "not yet delivered" and simply redelivers.
#[async_trait]
pub trait SyncLedger: Send + Sync {
    /// Whether a document's fan-out has been fully delivered.
    async fn is_synced(&self, id: &str) -> Result<bool, LedgerError>;

    /// Record a document's fan-out as delivered.
    ///
    /// A second call for the same id overwrites the summary, it does not
    /// merge; not calling twice is the orchestrator's responsibility.
    async fn mark_synced(&self, id: &str, summary: SyncSummary) -> Result<(), LedgerError>;

    /// The last committed log position.
    async fn cursor(&self) -> Result<Position, LedgerError>;

    /// Commit a new log position.
    ///
    /// Only the tailing pass advances the cursor; backfill never calls
    /// this.
    async fn set_cursor(&self, position: Position) -> Result<(), LedgerError>;

    /// Summary counters for the status surface.
    async fn stats(&self) -> Result<LedgerStats, LedgerError>;

    /// Drop every delivered-document entry, keeping the cursor.
    ///
    /// Operator escape hatch for forcing a full re-sync.
    async fn clear_entries(&self) -> Result<(), LedgerError>;
}
