//! Error types for the collaborator boundaries

use thiserror::Error;

use crate::event::Conflict;

/// Errors surfaced by a change source.
///
/// Connection-level errors are fatal to the pipeline: no tailing is
/// possible without the document log. Everything else is scoped to the
/// request that failed.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source is unreachable
    #[error("Change source connection failed: {0}")]
    Connection(String),

    /// A single request failed
    #[error("Change source request failed: {0}")]
    Request(String),

    /// The source answered with something the client could not parse
    #[error("Malformed change source response: {0}")]
    Malformed(String),
}

/// Errors surfaced by a delivery sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink is unreachable
    #[error("Delivery sink connection failed: {0}")]
    Connection(String),

    /// A single delivery request failed before a structured answer arrived
    #[error("Delivery request failed: {0}")]
    Request(String),

    /// The sink rejected the event with a structured failure
    #[error("Delivery rejected (status {status})")]
    Rejected {
        /// HTTP-like status code
        status: u16,
        /// Field-level validation errors, when the sink provided them
        conflicts: Vec<Conflict>,
    },

    /// The sink answered with something the client could not parse
    #[error("Malformed delivery sink response: {0}")]
    Malformed(String),
}
