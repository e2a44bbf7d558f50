//! # Vitals Core
//!
//! Shared data model and collaborator traits for the Vitals Bridge
//! synchronization pipeline.
//!
//! The bridge mirrors community health report documents from an append-only,
//! sequence-ordered document log into an external tracker API. This crate
//! defines the vocabulary every other crate speaks:
//!
//! - [`SourceDocument`] / [`DocumentChange`]: documents as observed in the log
//! - [`TargetEvent`]: the transformed event accepted by the tracker
//! - [`ChangeSource`] / [`ChangeFeed`]: abstract producer of the document log
//! - [`DeliverySink`]: abstract consumer of transformed events
//!
//! The concrete HTTP clients live in `vitals-client`; the orchestration
//! logic that composes these traits lives in `vitals-node`. Keeping the
//! traits here lets the orchestrator be exercised entirely against
//! in-memory fakes.

pub mod document;
pub mod error;
pub mod event;
pub mod sink;
pub mod source;

// Re-exports
pub use document::{Category, DocumentChange, Geolocation, Position, SourceDocument};
pub use error::{SinkError, SourceError};
pub use event::{Conflict, Coordinate, DataValue, DeliveryReceipt, Destination, EventStatus, TargetEvent};
pub use sink::DeliverySink;
pub use source::{ChangeFeed, ChangeSource};
