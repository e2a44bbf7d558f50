//! Dry-run delivery sink
//!
//! Logs the fully transformed event instead of posting it, so a
//! deployment's mapping tables can be rehearsed against live data with no
//! writes to the tracker. Ledger semantics are unchanged: whatever ledger
//! the operator configured still records "deliveries".

use async_trait::async_trait;
use tracing::info;

use vitals_core::{DeliveryReceipt, DeliverySink, SinkError, TargetEvent};

/// Sink that accepts everything and delivers nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunSink;

impl DryRunSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DeliverySink for DryRunSink {
    async fn check_connection(&self) -> Result<(), SinkError> {
        info!("dry-run sink active, events will be logged instead of delivered");
        Ok(())
    }

    async fn deliver(&self, event: &TargetEvent) -> Result<DeliveryReceipt, SinkError> {
        let payload =
            serde_json::to_string_pretty(event).map_err(|e| SinkError::Malformed(e.to_string()))?;
        info!(
            destination = %event.destination,
            values = event.data_values.len(),
            payload = %payload,
            "dry run: event not delivered"
        );
        Ok(DeliveryReceipt::new("DRY_RUN"))
    }
}
