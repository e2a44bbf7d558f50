//! # Vitals Node
//!
//! Sync orchestrator for the Vitals Bridge.
//!
//! [`SyncBridge`] composes the four collaborators — change source,
//! transformation router, delivery sink, and sync ledger — into the
//! incremental pipeline:
//!
//! 1. **Backfill**: a one-time bounded pass over historical documents,
//!    gated purely by ledger membership; the cursor is never touched.
//! 2. **Tailing**: continuous consumption of the live change feed from
//!    the durable cursor, committing the cursor only after a document's
//!    entire fan-out has been delivered.
//!
//! A document can safely be observed by both passes: the ledger check
//! runs before every delivery attempt, so the overlap is a skip, never a
//! duplicate delivery.
//!
//! ## Example
//!
//! ```rust,ignore
//! use vitals_node::{BridgeConfig, SyncBridge};
//!
//! let config = BridgeConfig::load("vitals-bridge.toml".as_ref())?;
//! let bridge = /* wire source, sink, ledger from config */;
//!
//! let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! bridge.run(shutdown_rx).await?;
//! ```

pub mod bridge;
pub mod config;
pub mod error;

// Re-exports
pub use bridge::{BackfillReport, BridgeOptions, BridgeStatus, Phase, SyncBridge};
pub use config::{BackfillConfig, BridgeConfig, RoutingConfig};
pub use error::{NodeError, NodeResult};
