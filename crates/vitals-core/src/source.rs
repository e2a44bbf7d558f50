//! Change source abstraction
//!
//! The document log is consumed through two shapes: a bounded historical
//! batch (backfill) and a resumable live feed (tailing). Deleted or
//! tombstoned log entries must be excluded by implementations before they
//! reach the pipeline.

use async_trait::async_trait;

use crate::document::{Category, DocumentChange, Position, SourceDocument};
use crate::error::SourceError;

/// Abstract producer of an ordered, resumable document log.
#[async_trait]
pub trait ChangeSource: Send + Sync {
    /// Verify the source is reachable.
    ///
    /// Called once at startup; an error here is fatal to the pipeline.
    async fn check_connection(&self) -> Result<(), SourceError>;

    /// Fetch up to `limit` historical documents of one category, in log
    /// order.
    async fn fetch_batch(
        &self,
        category: Category,
        limit: usize,
    ) -> Result<Vec<SourceDocument>, SourceError>;

    /// Open a live feed starting after `from`.
    ///
    /// The feed yields documents of known categories only, in log order,
    /// each paired with its position.
    async fn subscribe(&self, from: Position) -> Result<Box<dyn ChangeFeed>, SourceError>;
}

/// A live, potentially infinite sequence of document changes.
#[async_trait]
pub trait ChangeFeed: Send {
    /// Wait for the next change.
    ///
    /// Long-poll style: blocks until a change arrives. `Ok(None)` means the
    /// feed is exhausted (only finite test feeds ever return it).
    async fn next_change(&mut self) -> Result<Option<DocumentChange>, SourceError>;
}
