//! File-backed ledger
//!
//! Persists the full state as one pretty-printed JSON snapshot. Every
//! mutating call rewrites the file before returning, via write-to-temp
//! plus atomic rename so a crash mid-write leaves the previous snapshot
//! intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use vitals_core::Position;

use crate::error::LedgerError;
use crate::state::{LedgerState, LedgerStats, SyncSummary};
use crate::SyncLedger;

/// File-backed implementation of [`SyncLedger`].
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    state: RwLock<LedgerState>,
}

impl FileLedger {
    /// Open a ledger file, loading existing state if the file exists.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();

        let state = match tokio::fs::read_to_string(&path).await {
            Ok(data) => {
                let state: LedgerState = serde_json::from_str(&data)
                    .map_err(|e| LedgerError::Deserialization(e.to_string()))?;
                info!(
                    path = %path.display(),
                    entries = state.entries.len(),
                    cursor = %state.cursor,
                    "loaded sync ledger"
                );
                state
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no existing sync ledger, starting fresh");
                LedgerState::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    /// The snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize the given state and atomically replace the snapshot file.
    async fn persist(&self, state: &LedgerState) -> Result<(), LedgerError> {
        let data = serde_json::to_string_pretty(state)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data.as_bytes()).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), "persisted sync ledger");
        Ok(())
    }
}

#[async_trait]
impl SyncLedger for FileLedger {
    async fn is_synced(&self, id: &str) -> Result<bool, LedgerError> {
        Ok(self.state.read().await.entries.contains_key(id))
    }

    async fn mark_synced(&self, id: &str, summary: SyncSummary) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        state.entries.insert(id.to_string(), summary);
        state.last_sync_time = Some(Utc::now());
        self.persist(&state).await
    }

    async fn cursor(&self) -> Result<Position, LedgerError> {
        Ok(self.state.read().await.cursor.clone())
    }

    async fn set_cursor(&self, position: Position) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        state.cursor = position;
        state.last_sync_time = Some(Utc::now());
        self.persist(&state).await
    }

    async fn stats(&self) -> Result<LedgerStats, LedgerError> {
        Ok(self.state.read().await.stats())
    }

    async fn clear_entries(&self) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        state.entries.clear();
        info!("cleared all delivered-document entries");
        self.persist(&state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> SyncSummary {
        SyncSummary {
            delivered_at: Utc::now(),
            destinations: vec!["prog/stage".to_string()],
            event_count: 1,
            outcome: "OK".to_string(),
        }
    }

    #[tokio::test]
    async fn test_fresh_ledger_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FileLedger::open(dir.path().join("ledger.json")).await.unwrap();

        assert!(!ledger.is_synced("doc-a").await.unwrap());
        assert_eq!(ledger.cursor().await.unwrap(), Position::start());
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        {
            let ledger = FileLedger::open(&path).await.unwrap();
            ledger.mark_synced("doc-a", summary()).await.unwrap();
            ledger.set_cursor(Position::new("42-seq")).await.unwrap();
        }

        let reopened = FileLedger::open(&path).await.unwrap();
        assert!(reopened.is_synced("doc-a").await.unwrap());
        assert_eq!(reopened.cursor().await.unwrap(), Position::new("42-seq"));

        let stats = reopened.stats().await.unwrap();
        assert_eq!(stats.total_synced, 1);
        assert!(stats.last_sync_time.is_some());
    }

    #[tokio::test]
    async fn test_snapshot_roundtrips_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        let ledger = FileLedger::open(&path).await.unwrap();
        ledger.mark_synced("doc-a", summary()).await.unwrap();
        ledger.mark_synced("doc-b", summary()).await.unwrap();
        ledger.set_cursor(Position::new("7-abc")).await.unwrap();

        let on_disk: LedgerState =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let in_memory = {
            let reopened = FileLedger::open(&path).await.unwrap();
            reopened.state.read().await.clone()
        };
        assert_eq!(on_disk, in_memory);
    }

    #[tokio::test]
    async fn test_clear_entries_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        {
            let ledger = FileLedger::open(&path).await.unwrap();
            ledger.mark_synced("doc-a", summary()).await.unwrap();
            ledger.clear_entries().await.unwrap();
        }

        let reopened = FileLedger::open(&path).await.unwrap();
        assert!(!reopened.is_synced("doc-a").await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, "not json").unwrap();

        let result = FileLedger::open(&path).await;
        assert!(matches!(result, Err(LedgerError::Deserialization(_))));
    }
}
