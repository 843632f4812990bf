//! Batch orchestration.
//!
//! [`ReconcileEngine`] runs extraction, scoring and resolution over one batch
//! of source records and hands the result to an [`EdgeSink`]. Stages share
//! nothing but the read-only configuration, so one engine can serve
//! concurrent batches without locking.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::confidence::ConfidenceScorer;
use crate::config::ReconcileConfig;
use crate::conflict::ResolutionRecord;
use crate::edge::Edge;
use crate::error::{ReconcileError, ReconcileResult};
use crate::extract::ExtractorRegistry;
use crate::resolver::ConflictResolver;
use crate::source::SourceRecord;
use crate::storage::EdgeSink;
use crate::time::{Clock, SystemClock};

/// Counts reported back to the caller for a committed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    /// Resolved edges handed to the sink.
    pub relationship_count: usize,

    /// Targets with disputed ownership.
    pub conflict_count: usize,

    /// blake3 digest of the resolved edges; equal digests mean identical output.
    pub fingerprint: String,
}

/// Result of the pure stages, before persistence.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// One effective edge per target.
    pub edges: Vec<Edge>,

    /// Targets with disputed ownership.
    pub conflict_count: usize,

    /// Audit entries; empty unless the resolver retains them.
    pub records: Vec<ResolutionRecord>,
}

impl Reconciliation {
    /// Summarises this reconciliation.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::Internal` if the edges cannot be encoded for
    /// fingerprinting.
    pub fn summary(&self) -> ReconcileResult<BatchSummary> {
        Ok(BatchSummary {
            relationship_count: self.edges.len(),
            conflict_count: self.conflict_count,
            fingerprint: fingerprint(&self.edges)?,
        })
    }
}

/// Stable digest over the canonical JSON encoding of `edges`.
///
/// # Errors
///
/// Returns `ReconcileError::Internal` if encoding fails.
pub fn fingerprint(edges: &[Edge]) -> ReconcileResult<String> {
    let encoded = serde_json::to_vec(edges)
        .map_err(|e| ReconcileError::internal(format!("failed to encode edges: {e}")))?;
    Ok(blake3::hash(&encoded).to_hex().to_string())
}

/// Extract → score → resolve → persist.
pub struct ReconcileEngine {
    extractor: ExtractorRegistry,
    scorer: ConfidenceScorer,
    resolver: ConflictResolver,
    sink: Arc<dyn EdgeSink>,
}

impl ReconcileEngine {
    /// Creates an engine with the built-in parsers and the system clock.
    #[must_use]
    pub fn new(config: &ReconcileConfig, sink: Arc<dyn EdgeSink>) -> Self {
        Self::with_clock(config, sink, Arc::new(SystemClock))
    }

    /// Creates an engine reading "now" from `clock`.
    #[must_use]
    pub fn with_clock(
        config: &ReconcileConfig,
        sink: Arc<dyn EdgeSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let scorer = ConfidenceScorer::new(Arc::new(config.weights.clone()), config.scoring)
            .with_clock(Arc::clone(&clock));
        let resolver = ConflictResolver::new(Arc::new(config.priorities.clone()), config.resolver)
            .with_clock(clock);
        Self {
            extractor: ExtractorRegistry::builtin(),
            scorer,
            resolver,
            sink,
        }
    }

    /// Replaces the extractor registry.
    #[must_use]
    pub fn with_extractor(mut self, extractor: ExtractorRegistry) -> Self {
        self.extractor = extractor;
        self
    }

    /// Registry used by the extraction stage.
    #[must_use]
    pub fn extractor(&self) -> &ExtractorRegistry {
        &self.extractor
    }

    /// Runs the pure stages only; nothing is persisted.
    #[must_use]
    pub fn reconcile(&self, records: &[SourceRecord]) -> Reconciliation {
        let extracted = self.extractor.extract(records);
        let extracted_count = extracted.len();

        let scored = self.scorer.score(extracted);
        let scored_count = scored.len();

        let resolution = self.resolver.resolve(scored);
        tracing::debug!(
            records = records.len(),
            extracted = extracted_count,
            scored = scored_count,
            resolved = resolution.edges.len(),
            conflicts = resolution.conflict_count,
            "reconciled batch"
        );

        Reconciliation {
            edges: resolution.edges,
            conflict_count: resolution.conflict_count,
            records: resolution.records,
        }
    }

    /// Reconciles a batch and persists the resolved edges.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::Persistence` if the sink fails. The batch is
    /// then aborted as a whole; the engine does not retry.
    pub fn run(&self, records: &[SourceRecord]) -> ReconcileResult<BatchSummary> {
        let span = tracing::info_span!("reconcile_batch", records = records.len());
        let _guard = span.enter();

        let reconciliation = self.reconcile(records);
        self.commit(&reconciliation)
    }

    /// Persists an already computed reconciliation.
    ///
    /// Lets a caller inspect the audit records of exactly the edges that are
    /// committed.
    ///
    /// # Errors
    ///
    /// See [`Self::run`].
    pub fn commit(&self, reconciliation: &Reconciliation) -> ReconcileResult<BatchSummary> {
        let summary = reconciliation.summary()?;

        if let Err(e) = self.sink.persist(&reconciliation.edges) {
            tracing::error!(error = %e, edges = reconciliation.edges.len(), "persistence failed, batch aborted");
            return Err(e.into());
        }

        tracing::info!(
            relationships = summary.relationship_count,
            conflicts = summary.conflict_count,
            "batch committed"
        );
        Ok(summary)
    }
}

impl std::fmt::Debug for ReconcileEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconcileEngine")
            .field("extractor", &self.extractor)
            .field("scorer", &self.scorer)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;
    use crate::storage::{InMemoryEdgeSink, SinkError};
    use crate::time::FixedClock;

    struct FailingSink;

    impl EdgeSink for FailingSink {
        fn persist(&self, _edges: &[Edge]) -> Result<(), SinkError> {
            Err(SinkError::Unavailable("graph store offline".to_string()))
        }
    }

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()))
    }

    fn batch() -> Vec<SourceRecord> {
        vec![
            SourceRecord::new(
                "aws-tags",
                json!({ "resources": [{ "arn": "repoA", "tags": { "Owner": "alice" } }] }),
                0.8,
                "2024-06-01T00:00:00Z",
            ),
            SourceRecord::new(
                "github-codeowners",
                json!({ "entries": [{ "path": "repoA", "owners": ["@bob"] }] }),
                0.9,
                "2024-06-01T00:00:00Z",
            ),
        ]
    }

    #[test]
    fn run_persists_and_summarises() {
        let sink = Arc::new(InMemoryEdgeSink::new());
        let engine = ReconcileEngine::with_clock(&ReconcileConfig::default(), sink.clone(), clock());

        let summary = engine.run(&batch()).unwrap();
        assert_eq!(summary.relationship_count, 1);
        assert_eq!(summary.conflict_count, 1);
        assert_eq!(summary.fingerprint.len(), 64);

        let stored = sink.edges().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].from, "alice");
        assert!(stored[0].has_conflict);
    }

    #[test]
    fn persistence_failure_aborts_batch() {
        let engine =
            ReconcileEngine::with_clock(&ReconcileConfig::default(), Arc::new(FailingSink), clock());
        let err = engine.run(&batch()).unwrap_err();
        assert!(err.is_persistence());
        assert!(err.is_retryable());
    }

    #[test]
    fn reconcile_does_not_persist() {
        let sink = Arc::new(InMemoryEdgeSink::new());
        let engine = ReconcileEngine::with_clock(&ReconcileConfig::default(), sink.clone(), clock());
        let result = engine.reconcile(&batch());
        assert_eq!(result.edges.len(), 1);
        assert!(sink.is_empty().unwrap());
    }

    #[test]
    fn commit_persists_the_inspected_edges() {
        let sink = Arc::new(InMemoryEdgeSink::new());
        let mut config = ReconcileConfig::default();
        config.resolver.retain_audit = true;
        let engine = ReconcileEngine::with_clock(&config, sink.clone(), clock());

        let reconciliation = engine.reconcile(&batch());
        assert_eq!(reconciliation.records.len(), 1);
        let summary = engine.commit(&reconciliation).unwrap();

        assert_eq!(summary, reconciliation.summary().unwrap());
        assert_eq!(sink.edges().unwrap(), reconciliation.edges);
        assert_eq!(reconciliation.records[0].winner, reconciliation.edges[0]);
        assert_eq!(sink.batches().unwrap(), 1);
    }

    #[test]
    fn summary_wire_names() {
        let summary = BatchSummary {
            relationship_count: 3,
            conflict_count: 1,
            fingerprint: "abc".to_string(),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["relationshipCount"], 3);
        assert_eq!(json["conflictCount"], 1);
    }

    #[test]
    fn empty_batch_commits_nothing() {
        let sink = Arc::new(InMemoryEdgeSink::new());
        let engine = ReconcileEngine::with_clock(&ReconcileConfig::default(), sink.clone(), clock());
        let summary = engine.run(&[]).unwrap();
        assert_eq!(summary.relationship_count, 0);
        assert_eq!(summary.conflict_count, 0);
        assert_eq!(sink.batches().unwrap(), 1);
    }
}
