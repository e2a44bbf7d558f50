//! In-memory ledger
//!
//! Holds the full state behind a `tokio::sync::RwLock`. Suitable for tests
//! and dry-runs; nothing survives the process.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use vitals_core::Position;

use crate::error::LedgerError;
use crate::state::{LedgerState, LedgerStats, SyncSummary};
use crate::SyncLedger;

/// In-memory implementation of [`SyncLedger`].
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger seeded with existing state.
    pub fn with_state(state: LedgerState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Clone of the current state, for assertions in tests.
    pub async fn snapshot(&self) -> LedgerState {
        self.state.read().await.clone()
    }
}

#[async_trait]
impl SyncLedger for MemoryLedger {
    async fn is_synced(&self, id: &str) -> Result<bool, LedgerError> {
        Ok(self.state.read().await.entries.contains_key(id))
    }

    async fn mark_synced(&self, id: &str, summary: SyncSummary) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        state.entries.insert(id.to_string(), summary);
        state.last_sync_time = Some(Utc::now());
        Ok(())
    }

    async fn cursor(&self) -> Result<Position, LedgerError> {
        Ok(self.state.read().await.cursor.clone())
    }

    async fn set_cursor(&self, position: Position) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        state.cursor = position;
        state.last_sync_time = Some(Utc::now());
        Ok(())
    }

    async fn stats(&self) -> Result<LedgerStats, LedgerError> {
        Ok(self.state.read().await.stats())
    }

    async fn clear_entries(&self) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        state.entries.clear();
        Ok(())
    }
}
