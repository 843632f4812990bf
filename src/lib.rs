//! # ownership-reconcile
//!
//! Reconciles resource-ownership assertions scraped from independent,
//! untrusted sources into one consistent set of `owns` edges for a graph
//! store.
//!
//! ## Pipeline
//!
//! - **Extract**: each source's payload is parsed into canonical [`Edge`]s
//! - **Score**: confidence is weighted by source reliability, discounted by
//!   age, and boosted when several sources agree
//! - **Resolve**: each target keeps exactly one owner; disputes are settled
//!   by source priority and flagged with `has_conflict`
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use ownership_reconcile::{InMemoryEdgeSink, ReconcileConfig, ReconcileEngine, SourceRecord};
//! use serde_json::json;
//!
//! let sink = Arc::new(InMemoryEdgeSink::new());
//! let engine = ReconcileEngine::new(&ReconcileConfig::default(), sink.clone());
//!
//! let batch = vec![
//!     SourceRecord::new(
//!         "aws-tags",
//!         json!({ "resources": [{ "arn": "arn:aws:s3:::logs", "tags": { "Owner": "alice" } }] }),
//!         0.8,
//!         "2024-05-01T12:00:00Z",
//!     ),
//!     SourceRecord::new(
//!         "github-codeowners",
//!         json!({ "entries": [{ "path": "arn:aws:s3:::logs", "owners": ["@bob"] }] }),
//!         0.9,
//!         "2024-05-01T12:00:00Z",
//!     ),
//! ];
//!
//! let summary = engine.run(&batch)?;
//! assert_eq!(summary.relationship_count, 1);
//! assert_eq!(summary.conflict_count, 1);
//! # Ok::<(), ownership_reconcile::ReconcileError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod confidence;
pub mod config;
pub mod conflict;
pub mod edge;
pub mod engine;
pub mod error;
pub mod extract;
pub mod resolver;
pub mod source;
pub mod storage;
pub mod time;
pub mod trust;

// Re-export primary types at crate root for convenience
pub use confidence::{freshness, freshness_for_age, ConfidenceScorer, ScoringConfig};
pub use config::ReconcileConfig;
pub use conflict::{ResolutionId, ResolutionKind, ResolutionMethod, ResolutionRecord};
pub use edge::{Edge, OWNS};
pub use engine::{fingerprint, BatchSummary, Reconciliation, ReconcileEngine};
pub use error::{ConfigError, ReconcileError, ReconcileResult, ValidationError};
pub use extract::{ExtractorRegistry, ParseFn};
pub use resolver::{ConflictResolver, Resolution, ResolverConfig};
pub use source::SourceRecord;
pub use storage::{EdgeSink, InMemoryEdgeSink, SinkError};
pub use time::{Clock, FixedClock, SystemClock};
pub use trust::{SourcePriorityTable, SourceWeightTable};
