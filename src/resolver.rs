//! Conflict detection and resolution.
//!
//! Scored edges are grouped by target. A target asserted by one owner is
//! deduplicated on confidence; a target asserted by distinct owners is a
//! conflict, settled by source priority. Either way exactly one edge per
//! target survives.
//!
//! Selection is pure and order-stable so a batch can be replayed to the
//! same result: ties always go to the edge encountered first.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::conflict::{ResolutionKind, ResolutionMethod, ResolutionRecord};
use crate::edge::Edge;
use crate::error::ValidationError;
use crate::time::{Clock, SystemClock};
use crate::trust::SourcePriorityTable;

/// Tunables for the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Conflicts settled on an edge scored below this are logged.
    ///
    /// Informational only; it never changes which edge wins.
    pub conflict_threshold: f64,

    /// Keep a [`ResolutionRecord`] for every deduplicated or contested target.
    pub retain_audit: bool,
}

impl ResolverConfig {
    /// Default conflict threshold.
    pub const DEFAULT_CONFLICT_THRESHOLD: f64 = 0.3;

    /// Checks the threshold is a finite number.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidParameter` for NaN or infinity.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.conflict_threshold.is_finite() {
            return Err(ValidationError::InvalidParameter {
                name: "conflict_threshold",
                value: self.conflict_threshold,
            });
        }
        Ok(())
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            conflict_threshold: Self::DEFAULT_CONFLICT_THRESHOLD,
            retain_audit: false,
        }
    }
}

/// Output of [`ConflictResolver::resolve`].
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// One effective edge per target, in order of first appearance.
    pub edges: Vec<Edge>,

    /// Number of targets with disputed ownership.
    pub conflict_count: usize,

    /// Audit entries; empty unless `retain_audit` is set.
    pub records: Vec<ResolutionRecord>,
}

/// Index of the highest-confidence edge; first wins ties.
///
/// Returns `None` for an empty slice.
#[must_use]
pub fn select_highest_confidence(edges: &[Edge]) -> Option<usize> {
    let (first, rest) = edges.split_first()?;
    let mut best = 0;
    let mut best_confidence = first.confidence;
    for (offset, edge) in rest.iter().enumerate() {
        if edge.confidence > best_confidence {
            best = offset + 1;
            best_confidence = edge.confidence;
        }
    }
    Some(best)
}

/// Index of the edge from the most trusted source; first wins ties.
///
/// Returns the index and the winning priority, or `None` for an empty slice.
#[must_use]
pub fn select_by_priority(edges: &[Edge], priorities: &SourcePriorityTable) -> Option<(usize, u32)> {
    let (first, rest) = edges.split_first()?;
    let mut best = 0;
    let mut best_rank = priorities.priority(&first.source);
    for (offset, edge) in rest.iter().enumerate() {
        let rank = priorities.priority(&edge.source);
        if rank < best_rank {
            best = offset + 1;
            best_rank = rank;
        }
    }
    Some((best, best_rank))
}

/// Settles ownership per target.
#[derive(Debug, Clone)]
pub struct ConflictResolver {
    priorities: Arc<SourcePriorityTable>,
    config: ResolverConfig,
    clock: Arc<dyn Clock>,
}

impl ConflictResolver {
    /// Creates a resolver. The clock only stamps audit records.
    #[must_use]
    pub fn new(priorities: Arc<SourcePriorityTable>, config: ResolverConfig) -> Self {
        Self {
            priorities,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock used to stamp audit records.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Active resolver parameters.
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolves a batch of scored edges.
    #[must_use]
    pub fn resolve(&self, edges: Vec<Edge>) -> Resolution {
        let mut resolution = Resolution::default();

        for group in group_by_target(edges) {
            if group.len() == 1 {
                resolution.edges.extend(group);
                continue;
            }

            let single_owner = group.windows(2).all(|w| w[0].from == w[1].from);
            let outcome = if single_owner {
                self.deduplicate(group)
            } else {
                resolution.conflict_count += 1;
                self.settle_conflict(group)
            };

            if let Some((winner, record)) = outcome {
                resolution.edges.push(winner);
                resolution.records.extend(record);
            }
        }

        resolution
    }

    fn deduplicate(&self, mut group: Vec<Edge>) -> Option<(Edge, Option<ResolutionRecord>)> {
        let idx = select_highest_confidence(&group)?;
        let winner = group.remove(idx);
        let record = self.config.retain_audit.then(|| {
            ResolutionRecord::new(
                ResolutionKind::Duplicate,
                winner.clone(),
                group,
                ResolutionMethod::HighestConfidence {
                    confidence: winner.confidence,
                },
                self.clock.now(),
            )
        });
        Some((winner, record))
    }

    fn settle_conflict(&self, mut group: Vec<Edge>) -> Option<(Edge, Option<ResolutionRecord>)> {
        let (idx, priority) = select_by_priority(&group, &self.priorities)?;
        let mut winner = group.remove(idx);
        winner.has_conflict = true;

        if winner.confidence < self.config.conflict_threshold {
            tracing::warn!(
                target_id = %winner.to,
                owner = %winner.from,
                source = %winner.source,
                confidence = winner.confidence,
                threshold = self.config.conflict_threshold,
                "conflict settled on a low-confidence edge"
            );
        } else {
            tracing::debug!(
                target_id = %winner.to,
                owner = %winner.from,
                source = %winner.source,
                priority,
                contenders = group.len() + 1,
                "conflict settled by source priority"
            );
        }

        let record = self.config.retain_audit.then(|| {
            ResolutionRecord::new(
                ResolutionKind::Conflict,
                winner.clone(),
                group,
                ResolutionMethod::SourcePriority { priority },
                self.clock.now(),
            )
        });
        Some((winner, record))
    }
}

/// Groups edges by `to`, keeping first-appearance order.
fn group_by_target(edges: Vec<Edge>) -> Vec<Vec<Edge>> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(edges.len());
    let mut groups: Vec<Vec<Edge>> = Vec::new();

    for edge in edges {
        match index.get(&edge.to) {
            Some(&slot) => groups[slot].push(edge),
            None => {
                index.insert(edge.to.clone(), groups.len());
                groups.push(vec![edge]);
            }
        }
    }
    groups
}
