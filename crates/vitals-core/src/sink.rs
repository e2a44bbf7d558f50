//! Delivery sink abstraction

use async_trait::async_trait;

use crate::error::SinkError;
use crate::event::{DeliveryReceipt, TargetEvent};

/// Abstract external system accepting transformed events.
///
/// Deliveries must be safe to repeat: the ledger is the first line of
/// defense against redelivery, but a crash between a successful delivery
/// and the ledger write will replay the document on the next run. The
/// sink's own idempotency handling (seeded by
/// [`TargetEvent::client_key`]) is the last line of defense against
/// double-counting at the destination.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    /// Verify the sink is reachable.
    ///
    /// Called once at startup; an error here is non-fatal — delivery is
    /// simply deferred to the first real event.
    async fn check_connection(&self) -> Result<(), SinkError>;

    /// Deliver one event, returning the sink's acceptance token.
    async fn deliver(&self, event: &TargetEvent) -> Result<DeliveryReceipt, SinkError>;
}
