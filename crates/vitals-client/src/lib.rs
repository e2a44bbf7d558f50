//! # Vitals Client
//!
//! Concrete HTTP collaborators for the Vitals Bridge:
//!
//! - [`CouchSource`]: a CouchDB-flavored [`ChangeSource`] reading report
//!   documents from a database's view index (backfill) and long-poll
//!   changes feed (tailing)
//! - [`TrackerSink`]: a DHIS2-flavored [`DeliverySink`] posting events to
//!   a tracker import endpoint
//! - [`DryRunSink`]: logs fully transformed events instead of posting
//!   them, for rehearsing a deployment against live data
//!
//! These shims are deliberately thin: all retry, idempotency, and ordering
//! policy lives in the orchestrator. The clients translate wire formats
//! and report structured failures, nothing more.
//!
//! [`ChangeSource`]: vitals_core::ChangeSource
//! [`DeliverySink`]: vitals_core::DeliverySink

pub mod couch;
pub mod dry_run;
pub mod tracker;

// Re-exports
pub use couch::{CouchConfig, CouchSource};
pub use dry_run::DryRunSink;
pub use tracker::{TrackerConfig, TrackerSink};
