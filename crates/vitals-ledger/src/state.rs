//! Persisted ledger state model
//!
//! The state is an operator-readable structured record and must round-trip
//! exactly through a full save/load cycle. Entries are keyed by document
//! id in a sorted map so the persisted form is stable across runs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vitals_core::Position;

/// Summary of one document's delivered fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    /// When the last event of the fan-out was accepted
    pub delivered_at: DateTime<Utc>,
    /// Destination identifiers the events were sent to
    pub destinations: Vec<String>,
    /// Number of events produced for this document
    pub event_count: usize,
    /// Opaque delivery-outcome token(s) reported by the sink
    pub outcome: String,
}

/// The full persisted ledger record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    /// Last committed log position
    #[serde(default = "Position::start")]
    pub cursor: Position,
    /// Delivered documents, keyed by document id
    #[serde(default)]
    pub entries: BTreeMap<String, SyncSummary>,
    /// When the ledger last recorded a successful sync
    #[serde(default)]
    pub last_sync_time: Option<DateTime<Utc>>,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            cursor: Position::start(),
            entries: BTreeMap::new(),
            last_sync_time: None,
        }
    }
}

impl LedgerState {
    /// Counters derived from the current state.
    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            total_synced: self.entries.len(),
            last_sync_time: self.last_sync_time,
            cursor: self.cursor.clone(),
        }
    }
}

/// Summary counters exposed on the status surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub total_synced: usize,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub cursor: Position,
}
