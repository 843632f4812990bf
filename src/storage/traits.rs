//! Persistence boundary.
//!
//! The engine does not own storage. It hands each batch's resolved edges to
//! an [`EdgeSink`] and treats any error as fatal for that batch.
//!
//! # Contract for implementations
//! - `persist` is all-or-nothing: on error nothing from the batch is visible
//! - Upserts are keyed by `(from, to, type)`; properties are replaced
//! - Re-persisting the same edges is a no-op in effect

use thiserror::Error;

use crate::edge::Edge;

/// Errors that can occur while persisting edges.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Backend reported a failure.
    #[error("Sink backend error: {0}")]
    Backend(String),

    /// Backend could not be reached.
    #[error("Sink unavailable: {0}")]
    Unavailable(String),

    /// Backend refused an edge.
    #[error("Edge rejected ({edge}): {reason}")]
    Rejected {
        /// Display form of the refused edge.
        edge: String,
        /// Why it was refused.
        reason: String,
    },
}

/// Destination for resolved edges.
pub trait EdgeSink: Send + Sync {
    /// Upserts every edge of a batch atomically.
    fn persist(&self, edges: &[Edge]) -> Result<(), SinkError>;
}
