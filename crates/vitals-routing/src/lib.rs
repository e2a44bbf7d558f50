//! # Vitals Routing
//!
//! Transformation router for the Vitals Bridge: turns one source document
//! into zero or more tracker events.
//!
//! The router is a pure function over `(document, context)` — no I/O, no
//! clock, deterministic output. Each known category owns a disjoint
//! field-mapping table plus a set of per-field normalizers, and the verbal
//! autopsy category additionally fans out across two independent
//! eligibility branches (maternal and perinatal), each with its own table
//! and destination.
//!
//! ## Routing rules
//!
//! - A field is emitted only if its source value is present and non-empty
//!   after normalization; absent optional fields are omitted, never sent
//!   as empty or null.
//! - Date-only values are coerced to full date-times by appending a
//!   midnight UTC component; timestamped values pass through unchanged.
//! - Free-text vocabulary values are looked up lower-cased; unmapped
//!   values fall back to a capitalized form of the original rather than
//!   being rejected.
//! - Documents matching no eligibility branch are skipped, not errored;
//!   the skip reason is emitted as a structured log event.

pub mod context;
pub mod normalize;
pub mod router;
pub mod tables;

// Re-exports
pub use context::RouterContext;
pub use router::route;
