//! The sync orchestrator
//!
//! [`SyncBridge`] is the only component with mutable process state. It
//! runs one document at a time, and within a document one event at a
//! time: delivery order to the ledger must match delivery order to the
//! sink for the partial-failure rule to hold, so fan-out is never
//! parallelized.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{RwLock, watch};
use tracing::{debug, info, warn};

use vitals_core::{
    Category, ChangeSource, DeliverySink, DocumentChange, SinkError, SourceDocument,
};
use vitals_ledger::{SyncLedger, SyncSummary};
use vitals_routing::{RouterContext, route};

use crate::error::NodeResult;

/// Orchestrator phase, visible on the status surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Backfilling,
    Tailing,
}

/// Tuning knobs for a bridge instance.
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// Delay between backfill delivery attempts
    pub pacing: Duration,
    /// Historical documents fetched per category during `run`
    pub backfill_limit: usize,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            pacing: Duration::from_millis(500),
            backfill_limit: 100,
        }
    }
}

/// Outcome of one backfill pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    /// Documents whose fan-out was fully delivered
    pub processed: usize,
    /// Documents skipped (already synced, or no eligible event)
    pub skipped: usize,
    /// Documents whose delivery sequence failed
    pub failed: usize,
}

impl std::fmt::Display for BackfillReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} processed, {} skipped, {} failed",
            self.processed, self.skipped, self.failed
        )
    }
}

/// Read-only status snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct BridgeStatus {
    pub phase: Phase,
    pub total_synced: usize,
    pub last_sync_time: Option<chrono::DateTime<Utc>>,
    pub cursor: vitals_core::Position,
}

/// What happened to one document.
enum DocumentOutcome {
    /// Every produced event was accepted and the ledger entry written
    Delivered,
    /// Ledger already records this document
    AlreadySynced,
    /// The router produced no events for it
    NotEligible,
    /// Some event in the fan-out failed; no ledger entry written
    Failed,
}

/// Composes source, router, sink and ledger into the sync pipeline.
pub struct SyncBridge {
    source: Arc<dyn ChangeSource>,
    sink: Arc<dyn DeliverySink>,
    ledger: Arc<dyn SyncLedger>,
    router_ctx: RouterContext,
    options: BridgeOptions,
    phase: RwLock<Phase>,
}

impl SyncBridge {
    /// Create a bridge over the given collaborators.
    pub fn new(
        source: Arc<dyn ChangeSource>,
        sink: Arc<dyn DeliverySink>,
        ledger: Arc<dyn SyncLedger>,
        router_ctx: RouterContext,
        options: BridgeOptions,
    ) -> Self {
        Self {
            source,
            sink,
            ledger,
            router_ctx,
            options,
            phase: RwLock::new(Phase::Idle),
        }
    }

    /// Verify connectivity and report the loaded ledger.
    ///
    /// An unreachable change source is fatal. An unreachable sink is not:
    /// delivery is simply deferred to the first real event, which will
    /// fail per-document and leave those documents eligible for a later
    /// run.
    pub async fn initialize(&self) -> NodeResult<()> {
        info!("initializing sync bridge");

        self.source.check_connection().await?;

        if let Err(err) = self.sink.check_connection().await {
            warn!(error = %err, "delivery sink unreachable at startup, deliveries deferred");
        }

        let stats = self.ledger.stats().await?;
        info!(
            total_synced = stats.total_synced,
            cursor = %stats.cursor,
            "ledger loaded"
        );
        Ok(())
    }

    /// One-time bounded pass over historical documents of one category.
    ///
    /// Gated purely by ledger membership; the cursor is never advanced
    /// here — backfill iterates a snapshot filter, not the log itself.
    pub async fn backfill(&self, category: Category, limit: usize) -> NodeResult<BackfillReport> {
        *self.phase.write().await = Phase::Backfilling;
        info!(category = %category, limit, "starting backfill");

        let docs = self.source.fetch_batch(category, limit).await?;
        info!(category = %category, count = docs.len(), "fetched historical documents");

        let mut report = BackfillReport::default();
        for doc in &docs {
            match self.process_document(doc).await {
                DocumentOutcome::Delivered => report.processed += 1,
                DocumentOutcome::AlreadySynced | DocumentOutcome::NotEligible => {
                    report.skipped += 1;
                    // No delivery attempt was made: no pacing needed.
                    continue;
                }
                DocumentOutcome::Failed => report.failed += 1,
            }
            tokio::time::sleep(self.options.pacing).await;
        }

        info!(category = %category, %report, "backfill complete");
        *self.phase.write().await = Phase::Idle;
        Ok(report)
    }

    /// Continuous live tail from the durable cursor.
    ///
    /// Returns when the shutdown signal fires or the feed ends; the
    /// in-flight document's delivery sequence always completes first.
    /// Change-source errors propagate: tailing is impossible without the
    /// log, and restart policy belongs to the caller.
    pub async fn tail(&self, mut shutdown: watch::Receiver<bool>) -> NodeResult<()> {
        *self.phase.write().await = Phase::Tailing;

        let cursor = self.ledger.cursor().await?;
        info!(%cursor, "starting live tail");
        let mut feed = self.source.subscribe(cursor).await?;

        loop {
            let change = tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    info!("shutdown requested, stopping tail");
                    return Ok(());
                }
                change = feed.next_change() => change?,
            };

            let Some(DocumentChange { doc, position }) = change else {
                info!("change feed ended");
                return Ok(());
            };

            if let DocumentOutcome::Delivered = self.process_document(&doc).await {
                // Cursor write failing after the ledger write is
                // tolerated: restart re-observes the document and the
                // ledger check makes it a skip.
                if let Err(err) = self.ledger.set_cursor(position.clone()).await {
                    warn!(%position, error = %err, "cursor write failed");
                }
            }
        }
    }

    /// Full service lifecycle: initialize, bounded backfill of every
    /// category, then tail until shutdown.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> NodeResult<()> {
        self.initialize().await?;

        for category in Category::ALL {
            if *shutdown.borrow() {
                return Ok(());
            }
            self.backfill(category, self.options.backfill_limit).await?;
        }

        if *shutdown.borrow() {
            return Ok(());
        }
        self.tail(shutdown).await
    }

    /// Read-only status snapshot.
    pub async fn status(&self) -> NodeResult<BridgeStatus> {
        let stats = self.ledger.stats().await?;
        Ok(BridgeStatus {
            phase: *self.phase.read().await,
            total_synced: stats.total_synced,
            last_sync_time: stats.last_sync_time,
            cursor: stats.cursor,
        })
    }

    /// The per-document delivery sequence shared by both phases.
    ///
    /// Ledger check → route → sequential delivery → single ledger write.
    /// Every failure is absorbed here; the phase loops never see it.
    async fn process_document(&self, doc: &SourceDocument) -> DocumentOutcome {
        match self.try_process(doc).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(doc_id = %doc.id, error = %err, "failed to process document");
                DocumentOutcome::Failed
            }
        }
    }

    async fn try_process(&self, doc: &SourceDocument) -> NodeResult<DocumentOutcome> {
        if self.ledger.is_synced(&doc.id).await? {
            debug!(doc_id = %doc.id, "document already synced, skipping");
            return Ok(DocumentOutcome::AlreadySynced);
        }

        let events = route(doc, &self.router_ctx);
        if events.is_empty() {
            info!(doc_id = %doc.id, form = %doc.form, "document produced no events, skipping");
            return Ok(DocumentOutcome::NotEligible);
        }

        let mut tokens = Vec::with_capacity(events.len());
        for (index, event) in events.iter().enumerate() {
            match self.sink.deliver(event).await {
                Ok(receipt) => {
                    info!(
                        doc_id = %doc.id,
                        destination = %event.destination,
                        token = %receipt.token,
                        "event delivered"
                    );
                    tokens.push(receipt.token);
                }
                Err(err) => {
                    if let SinkError::Rejected { conflicts, .. } = &err {
                        for conflict in conflicts {
                            warn!(doc_id = %doc.id, %conflict, "tracker conflict");
                        }
                    }
                    // Abort the remaining fan-out, keep the accepted
                    // events (no compensation), and withhold the ledger
                    // entry so a future run retries the whole document.
                    warn!(
                        doc_id = %doc.id,
                        destination = %event.destination,
                        delivered = index,
                        remaining = events.len() - index,
                        error = %err,
                        "event delivery failed, aborting fan-out"
                    );
                    return Ok(DocumentOutcome::Failed);
                }
            }
        }

        let summary = SyncSummary {
            delivered_at: Utc::now(),
            destinations: events.iter().map(|e| e.destination.to_string()).collect(),
            event_count: events.len(),
            outcome: tokens.join(","),
        };
        self.ledger.mark_synced(&doc.id, summary).await?;
        info!(doc_id = %doc.id, events = events.len(), "document synced");
        Ok(DocumentOutcome::Delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use vitals_core::{ChangeFeed, DeliveryReceipt, Position, SourceError, TargetEvent};
    use vitals_ledger::{FileLedger, MemoryLedger};

    fn doc(id: &str, form: &str, fields: Value) -> SourceDocument {
        SourceDocument {
            id: id.to_string(),
            form: form.to_string(),
            fields: fields.as_object().cloned().unwrap_or_default(),
            geolocation: None,
            reported_at: None,
        }
    }

    fn death_review(id: &str) -> SourceDocument {
        doc(id, "death_review", json!({"date_of_death": "2024-03-01"}))
    }

    /// Verbal autopsy document that fans out to both branches.
    fn double_va(id: &str) -> SourceDocument {
        doc(
            id,
            "cha_verbal_autopsy",
            json!({
                "patient_age_in_years": 30,
                "patient_sex": "female",
                "age_in_years": 0,
                "age_in_days": 10,
                "date_of_death": "2024-02-10"
            }),
        )
    }

    // -----------------------------------------------------------------
    // Scripted collaborators
    // -----------------------------------------------------------------

    struct ScriptedSource {
        batch: Vec<SourceDocument>,
        changes: Vec<DocumentChange>,
        reachable: bool,
    }

    impl ScriptedSource {
        fn new() -> Self {
            Self {
                batch: Vec::new(),
                changes: Vec::new(),
                reachable: true,
            }
        }

        fn with_batch(mut self, docs: Vec<SourceDocument>) -> Self {
            self.batch = docs;
            self
        }

        fn with_changes(mut self, changes: Vec<(SourceDocument, &str)>) -> Self {
            self.changes = changes
                .into_iter()
                .map(|(doc, pos)| DocumentChange {
                    doc,
                    position: Position::new(pos),
                })
                .collect();
            self
        }

        fn unreachable(mut self) -> Self {
            self.reachable = false;
            self
        }
    }

    #[async_trait]
    impl ChangeSource for ScriptedSource {
        async fn check_connection(&self) -> Result<(), SourceError> {
            if self.reachable {
                Ok(())
            } else {
                Err(SourceError::Connection("scripted outage".to_string()))
            }
        }

        async fn fetch_batch(
            &self,
            category: Category,
            limit: usize,
        ) -> Result<Vec<SourceDocument>, SourceError> {
            Ok(self
                .batch
                .iter()
                .filter(|d| d.category() == Some(category))
                .take(limit)
                .cloned()
                .collect())
        }

        async fn subscribe(&self, from: Position) -> Result<Box<dyn ChangeFeed>, SourceError> {
            // Resume strictly after `from`, the way a sequence-token
            // subscription would.
            let mut items: VecDeque<DocumentChange> = self.changes.iter().cloned().collect();
            if from != Position::start() {
                while let Some(change) = items.front() {
                    let passed = change.position == from;
                    items.pop_front();
                    if passed {
                        break;
                    }
                }
            }
            Ok(Box::new(ScriptedFeed { items }))
        }
    }

    struct ScriptedFeed {
        items: VecDeque<DocumentChange>,
    }

    #[async_trait]
    impl ChangeFeed for ScriptedFeed {
        async fn next_change(&mut self) -> Result<Option<DocumentChange>, SourceError> {
            Ok(self.items.pop_front())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<TargetEvent>>,
        calls: AtomicUsize,
        /// 1-based call number that fails; 0 disables failure
        fail_on_call: AtomicUsize,
        unreachable: bool,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self::default()
        }

        fn fail_on(self, call: usize) -> Self {
            self.fail_on_call.store(call, Ordering::SeqCst);
            self
        }

        fn unreachable(mut self) -> Self {
            self.unreachable = true;
            self
        }

        fn delivered_count(&self) -> usize {
            self.delivered.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl DeliverySink for RecordingSink {
        async fn check_connection(&self) -> Result<(), SinkError> {
            if self.unreachable {
                Err(SinkError::Connection("scripted outage".to_string()))
            } else {
                Ok(())
            }
        }

        async fn deliver(&self, event: &TargetEvent) -> Result<DeliveryReceipt, SinkError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_on_call.load(Ordering::SeqCst) == call {
                return Err(SinkError::Rejected {
                    status: 409,
                    conflicts: Vec::new(),
                });
            }
            self.delivered.lock().unwrap().push(event.clone());
            Ok(DeliveryReceipt::new(format!("OK-{call}")))
        }
    }

    fn bridge(
        source: Arc<ScriptedSource>,
        sink: Arc<RecordingSink>,
        ledger: Arc<MemoryLedger>,
    ) -> SyncBridge {
        SyncBridge::new(
            source,
            sink,
            ledger,
            RouterContext::for_tests(),
            BridgeOptions {
                pacing: Duration::ZERO,
                backfill_limit: 100,
            },
        )
    }

    /// A shutdown channel that never fires; the sender must be kept
    /// alive for the receiver to stay pending.
    fn shutdown_pair() -> (watch::Sender<bool>, watch::Receiver<bool>) {
        watch::channel(false)
    }

    // -----------------------------------------------------------------
    // Initialization
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn test_unreachable_source_is_fatal() {
        let b = bridge(
            Arc::new(ScriptedSource::new().unreachable()),
            Arc::new(RecordingSink::new()),
            Arc::new(MemoryLedger::new()),
        );
        assert!(b.initialize().await.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_sink_is_not_fatal() {
        let b = bridge(
            Arc::new(ScriptedSource::new()),
            Arc::new(RecordingSink::new().unreachable()),
            Arc::new(MemoryLedger::new()),
        );
        assert!(b.initialize().await.is_ok());
    }

    // -----------------------------------------------------------------
    // Backfill
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn test_backfill_delivers_and_reports() {
        let sink = Arc::new(RecordingSink::new());
        let ledger = Arc::new(MemoryLedger::new());
        let source = Arc::new(
            ScriptedSource::new().with_batch(vec![death_review("a"), death_review("b")]),
        );
        let b = bridge(source, sink.clone(), ledger.clone());

        let report = b.backfill(Category::DeathReview, 100).await.unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.failed, 0);
        assert_eq!(sink.delivered_count(), 2);
        assert!(ledger.is_synced("a").await.unwrap());
        assert!(ledger.is_synced("b").await.unwrap());
    }

    #[tokio::test]
    async fn test_backfill_never_advances_cursor() {
        let ledger = Arc::new(MemoryLedger::new());
        let source = Arc::new(ScriptedSource::new().with_batch(vec![death_review("a")]));
        let b = bridge(source, Arc::new(RecordingSink::new()), ledger.clone());

        b.backfill(Category::DeathReview, 100).await.unwrap();
        assert_eq!(ledger.cursor().await.unwrap(), Position::start());
    }

    #[tokio::test]
    async fn test_backfill_respects_limit() {
        let sink = Arc::new(RecordingSink::new());
        let source = Arc::new(ScriptedSource::new().with_batch(vec![
            death_review("a"),
            death_review("b"),
            death_review("c"),
        ]));
        let b = bridge(source, sink.clone(), Arc::new(MemoryLedger::new()));

        let report = b.backfill(Category::DeathReview, 2).await.unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(sink.delivered_count(), 2);
    }

    #[tokio::test]
    async fn test_second_backfill_makes_no_sink_calls() {
        let sink = Arc::new(RecordingSink::new());
        let ledger = Arc::new(MemoryLedger::new());
        let source = Arc::new(
            ScriptedSource::new().with_batch(vec![death_review("a"), death_review("b")]),
        );
        let b = bridge(source, sink.clone(), ledger.clone());

        b.backfill(Category::DeathReview, 100).await.unwrap();
        let calls_after_first = sink.calls.load(Ordering::SeqCst);

        let report = b.backfill(Category::DeathReview, 100).await.unwrap();
        assert_eq!(report.processed, 0);
        assert_eq!(report.skipped, 2);
        assert_eq!(sink.calls.load(Ordering::SeqCst), calls_after_first);
    }

    #[tokio::test]
    async fn test_ineligible_document_gets_no_ledger_entry() {
        let sink = Arc::new(RecordingSink::new());
        let ledger = Arc::new(MemoryLedger::new());
        let ineligible = doc(
            "x",
            "cha_verbal_autopsy",
            json!({
                "patient_age_in_years": 60,
                "patient_sex": "male",
                "age_in_years": 60,
                "date_of_death": "2024-02-10"
            }),
        );
        let source = Arc::new(ScriptedSource::new().with_batch(vec![ineligible]));
        let b = bridge(source, sink.clone(), ledger.clone());

        let report = b.backfill(Category::VerbalAutopsy, 100).await.unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 0);
        assert!(!ledger.is_synced("x").await.unwrap());
    }

    // -----------------------------------------------------------------
    // Partial fan-out failure
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn test_failing_second_event_withholds_ledger_entry() {
        let sink = Arc::new(RecordingSink::new().fail_on(2));
        let ledger = Arc::new(MemoryLedger::new());
        let source = Arc::new(ScriptedSource::new().with_batch(vec![double_va("va-1")]));
        let b = bridge(source, sink.clone(), ledger.clone());

        let report = b.backfill(Category::VerbalAutopsy, 100).await.unwrap();
        assert_eq!(report.failed, 1);

        // First event stays delivered (no compensating call), second never
        // lands, and the document remains eligible for a future run.
        assert_eq!(sink.delivered_count(), 1);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 2);
        assert!(!ledger.is_synced("va-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_document_is_retried_on_a_later_run() {
        let sink = Arc::new(RecordingSink::new().fail_on(2));
        let ledger = Arc::new(MemoryLedger::new());
        let source =
            Arc::new(ScriptedSource::new().with_batch(vec![double_va("va-1")]));
        let b = bridge(source.clone(), sink.clone(), ledger.clone());

        b.backfill(Category::VerbalAutopsy, 100).await.unwrap();
        assert!(!ledger.is_synced("va-1").await.unwrap());

        // Next run: the sink has recovered.
        sink.fail_on_call.store(0, Ordering::SeqCst);
        let report = b.backfill(Category::VerbalAutopsy, 100).await.unwrap();
        assert_eq!(report.processed, 1);
        assert!(ledger.is_synced("va-1").await.unwrap());

        let state = ledger.snapshot().await;
        assert_eq!(state.entries["va-1"].event_count, 2);
        assert_eq!(state.entries["va-1"].destinations.len(), 2);
    }

    // -----------------------------------------------------------------
    // Tailing
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn test_tail_advances_cursor_per_delivered_document() {
        let sink = Arc::new(RecordingSink::new());
        let ledger = Arc::new(MemoryLedger::new());
        let source = Arc::new(ScriptedSource::new().with_changes(vec![
            (death_review("a"), "1-a"),
            (death_review("b"), "2-b"),
            (death_review("c"), "3-c"),
        ]));
        let b = bridge(source, sink.clone(), ledger.clone());

        let (_shutdown_tx, shutdown_rx) = shutdown_pair();
        b.tail(shutdown_rx).await.unwrap();

        assert_eq!(sink.delivered_count(), 3);
        assert_eq!(ledger.cursor().await.unwrap(), Position::new("3-c"));
    }

    #[tokio::test]
    async fn test_restart_resumes_after_cursor_without_redelivery() {
        let sink = Arc::new(RecordingSink::new());
        let ledger = Arc::new(MemoryLedger::new());
        let changes = vec![
            (death_review("a"), "1-a"),
            (death_review("b"), "2-b"),
        ];
        let source = Arc::new(ScriptedSource::new().with_changes(changes.clone()));
        let b = bridge(source, sink.clone(), ledger.clone());
        let (_shutdown_tx, shutdown_rx) = shutdown_pair();
        b.tail(shutdown_rx).await.unwrap();
        assert_eq!(sink.delivered_count(), 2);

        // Simulated restart: same ledger, fresh bridge over the same log.
        let source = Arc::new(ScriptedSource::new().with_changes(changes));
        let b = bridge(source, sink.clone(), ledger.clone());
        let (_shutdown_tx, shutdown_rx) = shutdown_pair();
        b.tail(shutdown_rx).await.unwrap();

        assert_eq!(sink.delivered_count(), 2);
        assert_eq!(ledger.cursor().await.unwrap(), Position::new("2-b"));
    }

    #[tokio::test]
    async fn test_tail_skips_failed_document_and_continues() {
        let sink = Arc::new(RecordingSink::new().fail_on(1));
        let ledger = Arc::new(MemoryLedger::new());
        let source = Arc::new(ScriptedSource::new().with_changes(vec![
            (death_review("a"), "1-a"),
            (death_review("b"), "2-b"),
        ]));
        let b = bridge(source, sink.clone(), ledger.clone());

        let (_shutdown_tx, shutdown_rx) = shutdown_pair();
        b.tail(shutdown_rx).await.unwrap();

        // "a" stays out of the ledger (eligible for a future backfill);
        // "b" delivered and moved the cursor.
        assert!(!ledger.is_synced("a").await.unwrap());
        assert!(ledger.is_synced("b").await.unwrap());
        assert_eq!(ledger.cursor().await.unwrap(), Position::new("2-b"));
    }

    #[tokio::test]
    async fn test_shutdown_before_tail_processes_nothing() {
        let sink = Arc::new(RecordingSink::new());
        let source = Arc::new(
            ScriptedSource::new().with_changes(vec![(death_review("a"), "1-a")]),
        );
        let b = bridge(source, sink.clone(), Arc::new(MemoryLedger::new()));

        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        b.tail(rx).await.unwrap();

        assert_eq!(sink.calls.load(Ordering::SeqCst), 0);
    }

    // -----------------------------------------------------------------
    // Backfill-to-tail handoff
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn test_document_observed_by_both_passes_delivers_once() {
        let sink = Arc::new(RecordingSink::new());
        let ledger = Arc::new(MemoryLedger::new());
        // "a" is both in history and still in the change feed window.
        let source = Arc::new(
            ScriptedSource::new()
                .with_batch(vec![death_review("a")])
                .with_changes(vec![(death_review("a"), "1-a"), (death_review("b"), "2-b")]),
        );
        let b = bridge(source, sink.clone(), ledger.clone());

        let (_shutdown_tx, shutdown_rx) = shutdown_pair();
        b.run(shutdown_rx).await.unwrap();

        // One delivery for "a" (backfill), one for "b" (tail).
        assert_eq!(sink.delivered_count(), 2);
        assert!(ledger.is_synced("a").await.unwrap());
        assert!(ledger.is_synced("b").await.unwrap());
        assert_eq!(ledger.cursor().await.unwrap(), Position::new("2-b"));
    }

    #[tokio::test]
    async fn test_file_ledger_survives_bridge_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let sink = Arc::new(RecordingSink::new());
        let changes = vec![(death_review("a"), "1-a")];

        {
            let ledger = Arc::new(FileLedger::open(&path).await.unwrap());
            let source = Arc::new(ScriptedSource::new().with_changes(changes.clone()));
            let b = SyncBridge::new(
                source,
                sink.clone(),
                ledger,
                RouterContext::for_tests(),
                BridgeOptions {
                    pacing: Duration::ZERO,
                    backfill_limit: 100,
                },
            );
            let (_shutdown_tx, shutdown_rx) = shutdown_pair();
            b.tail(shutdown_rx).await.unwrap();
        }
        assert_eq!(sink.delivered_count(), 1);

        // Restarted process: fresh bridge over the reopened ledger and
        // the same log window.
        let ledger = Arc::new(FileLedger::open(&path).await.unwrap());
        let source = Arc::new(ScriptedSource::new().with_changes(changes));
        let b = SyncBridge::new(
            source,
            sink.clone(),
            ledger.clone(),
            RouterContext::for_tests(),
            BridgeOptions {
                pacing: Duration::ZERO,
                backfill_limit: 100,
            },
        );
        let (_shutdown_tx, shutdown_rx) = shutdown_pair();
        b.tail(shutdown_rx).await.unwrap();

        assert_eq!(sink.delivered_count(), 1);
        assert_eq!(ledger.cursor().await.unwrap(), Position::new("1-a"));
    }

    // -----------------------------------------------------------------
    // Status
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn test_status_reflects_ledger() {
        let ledger = Arc::new(MemoryLedger::new());
        let source = Arc::new(ScriptedSource::new().with_batch(vec![death_review("a")]));
        let b = bridge(source, Arc::new(RecordingSink::new()), ledger.clone());

        let status = b.status().await.unwrap();
        assert_eq!(status.phase, Phase::Idle);
        assert_eq!(status.total_synced, 0);

        b.backfill(Category::DeathReview, 100).await.unwrap();
        let status = b.status().await.unwrap();
        assert_eq!(status.total_synced, 1);
        assert!(status.last_sync_time.is_some());
    }
}
