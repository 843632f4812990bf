//! Confidence scoring.
//!
//! A raw scraper confidence is only meaningful relative to who produced it
//! and when. The scorer turns it into a trust score:
//!
//! ```text
//! single(e)  = min(1, raw(e) * weight(source(e)) * freshness(timestamp(e)))
//! agreed(G)  = min(1, max_{e in G} single(e) + agreement_bonus)
//! freshness  = exp(-age_days * decay_rate / 30)
//! ```
//!
//! Edges asserting the same `(from, to)` pair collapse into one: the member
//! with the best single-source score survives and carries the agreed score.
//! Scores are clamped above at 1.0 but never floored. A NaN raw confidence
//! stays NaN and never outscores a comparable member.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::edge::Edge;
use crate::error::ValidationError;
use crate::time::{age_in_days, parse_timestamp, Clock, SystemClock};
use crate::trust::SourceWeightTable;

/// Upper bound applied to every computed score.
pub const MAX_CONFIDENCE: f64 = 1.0;

/// Days over which `decay_rate` is expressed.
const DECAY_WINDOW_DAYS: f64 = 30.0;

/// Tunables for the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Added to the best member's score when several sources assert one edge.
    pub agreement_bonus: f64,

    /// Decay per 30 days of age; 0.05 means ~5% per month.
    pub decay_rate: f64,
}

impl ScoringConfig {
    /// Default agreement bonus.
    pub const DEFAULT_AGREEMENT_BONUS: f64 = 0.1;

    /// Default decay rate.
    pub const DEFAULT_DECAY_RATE: f64 = 0.05;

    /// Checks that both parameters are finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidParameter` naming the offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (name, value) in [
            ("agreement_bonus", self.agreement_bonus),
            ("decay_rate", self.decay_rate),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            agreement_bonus: Self::DEFAULT_AGREEMENT_BONUS,
            decay_rate: Self::DEFAULT_DECAY_RATE,
        }
    }
}

/// Exponential freshness discount for an age in days.
///
/// Ages below zero (future timestamps) count as zero, so the result never
/// exceeds 1.0.
///
/// ```
/// use ownership_reconcile::confidence::freshness_for_age;
///
/// assert_eq!(freshness_for_age(0.0, 0.05), 1.0);
/// assert!((freshness_for_age(30.0, 0.05) - (-0.05f64).exp()).abs() < 1e-12);
/// ```
#[must_use]
pub fn freshness_for_age(age_days: f64, decay_rate: f64) -> f64 {
    let age = age_days.max(0.0);
    (-age * decay_rate / DECAY_WINDOW_DAYS).exp()
}

/// Freshness of a raw timestamp relative to `now`.
///
/// Unparseable timestamps are not penalised: the result is 1.0.
#[must_use]
pub fn freshness(timestamp: &str, now: DateTime<Utc>, decay_rate: f64) -> f64 {
    match parse_timestamp(timestamp) {
        Some(captured) => freshness_for_age(age_in_days(captured, now), decay_rate),
        None => {
            tracing::trace!(timestamp, "unparseable timestamp, freshness left neutral");
            1.0
        }
    }
}

/// Scores edges against a weight table.
#[derive(Debug, Clone)]
pub struct ConfidenceScorer {
    weights: Arc<SourceWeightTable>,
    config: ScoringConfig,
    clock: Arc<dyn Clock>,
}

impl ConfidenceScorer {
    /// Creates a scorer reading the system clock.
    #[must_use]
    pub fn new(weights: Arc<SourceWeightTable>, config: ScoringConfig) -> Self {
        Self {
            weights,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Active scoring parameters.
    #[must_use]
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Single-source score of `edge` at `now`.
    #[must_use]
    pub fn single_score(&self, edge: &Edge, now: DateTime<Utc>) -> f64 {
        let weight = self.weights.weight(&edge.source);
        let fresh = freshness(&edge.timestamp, now, self.config.decay_rate);
        clamp_score(edge.confidence * weight * fresh)
    }

    /// Scores a batch.
    ///
    /// Returns one edge per distinct `(from, to)` pair, in order of first
    /// appearance. "Now" is read once so every edge in the batch ages
    /// against the same instant.
    #[must_use]
    pub fn score(&self, edges: Vec<Edge>) -> Vec<Edge> {
        let now = self.clock.now();
        let groups = group_by_pair(edges);
        let mut scored = Vec::with_capacity(groups.len());

        for group in groups {
            if let Some(edge) = self.score_group(group, now) {
                scored.push(edge);
            }
        }
        scored
    }

    fn score_group(&self, group: Vec<Edge>, now: DateTime<Utc>) -> Option<Edge> {
        let members = group.len();
        let mut best: Option<(Edge, f64)> = None;

        for edge in group {
            let score = self.single_score(&edge, now);
            // Strict comparison: the first member wins ties.
            let better = match &best {
                Some((_, best_score)) => {
                    score > *best_score || (best_score.is_nan() && !score.is_nan())
                }
                None => true,
            };
            if better {
                best = Some((edge, score));
            }
        }

        let (mut edge, score) = best?;
        edge.confidence = if members > 1 {
            let agreed = clamp_score(score + self.config.agreement_bonus);
            tracing::debug!(
                from = %edge.from,
                to = %edge.to,
                members,
                winner = %edge.source,
                confidence = agreed,
                "collapsed corroborated edge"
            );
            agreed
        } else {
            score
        };
        Some(edge)
    }
}

/// Caps `score` at [`MAX_CONFIDENCE`]. `f64::min` would turn NaN into the cap.
fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        score
    } else {
        score.min(MAX_CONFIDENCE)
    }
}

/// Groups edges by `(from, to)`, keeping first-appearance order of groups
/// and of members within a group.
fn group_by_pair(edges: Vec<Edge>) -> Vec<Vec<Edge>> {
    let mut index: HashMap<(String, String), usize> = HashMap::with_capacity(edges.len());
    let mut groups: Vec<Vec<Edge>> = Vec::new();

    for edge in edges {
        let key = (edge.from.clone(), edge.to.clone());
        match index.get(&key) {
            Some(&slot) => groups[slot].push(edge),
            None => {
                index.insert(key, groups.len());
                groups.push(vec![edge]);
            }
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::time::FixedClock;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn ts(days_ago: i64) -> String {
        (now() - Duration::days(days_ago)).to_rfc3339()
    }

    fn scorer() -> ConfidenceScorer {
        ConfidenceScorer::new(Arc::new(SourceWeightTable::default()), ScoringConfig::default())
            .with_clock(Arc::new(FixedClock::new(now())))
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn freshness_at_zero_and_thirty_days() {
        assert_eq!(freshness_for_age(0.0, 0.05), 1.0);
        assert!(close(freshness_for_age(30.0, 0.05), (-0.05f64).exp()));
        assert!((freshness_for_age(30.0, 0.05) - 0.951).abs() < 1e-3);
    }

    #[test]
    fn freshness_is_monotonic() {
        let mut last = f64::INFINITY;
        for days in [0.0, 1.0, 7.0, 30.0, 90.0, 365.0] {
            let f = freshness_for_age(days, 0.05);
            assert!(f <= last);
            last = f;
        }
    }

    #[test]
    fn freshness_future_timestamp_is_neutral() {
        assert_eq!(freshness_for_age(-10.0, 0.05), 1.0);
        let future = (now() + Duration::days(3)).to_rfc3339();
        assert_eq!(freshness(&future, now(), 0.05), 1.0);
    }

    #[test]
    fn freshness_unparseable_timestamp_is_neutral() {
        assert_eq!(freshness("not-a-time", now(), 0.05), 1.0);
        assert_eq!(freshness("", now(), 0.05), 1.0);
    }

    #[test]
    fn single_source_score() {
        let edges = vec![Edge::owns("alice", "repoA", 0.8, "aws-tags", ts(0))];
        let scored = scorer().score(edges);
        assert_eq!(scored.len(), 1);
        assert!(close(scored[0].confidence, 0.72));
    }

    #[test]
    fn single_source_score_decays() {
        let edges = vec![Edge::owns("alice", "repoA", 0.8, "aws-tags", ts(30))];
        let scored = scorer().score(edges);
        assert!(close(scored[0].confidence, 0.72 * (-0.05f64).exp()));
    }

    #[test]
    fn unknown_source_uses_default_weight() {
        let edges = vec![Edge::owns("alice", "repoA", 1.0, "pagerduty", ts(0))];
        let scored = scorer().score(edges);
        assert!(close(scored[0].confidence, 0.5));
    }

    #[test]
    fn score_clamped_above_not_below() {
        let edges = vec![
            Edge::owns("alice", "repoA", 5.0, "aws-tags", ts(0)),
            Edge::owns("bob", "repoB", -0.4, "aws-tags", ts(0)),
        ];
        let scored = scorer().score(edges);
        assert_eq!(scored[0].confidence, 1.0);
        assert!(close(scored[1].confidence, -0.36));
    }

    #[test]
    fn corroborated_edge_collapses_with_bonus() {
        let edges = vec![
            Edge::owns("alice", "repoA", 0.8, "github-activity", ts(0)),
            Edge::owns("alice", "repoA", 0.8, "aws-tags", ts(0)),
        ];
        let scored = scorer().score(edges);
        assert_eq!(scored.len(), 1);
        // max(0.48, 0.72) + 0.1
        assert!(close(scored[0].confidence, 0.82));
        assert_eq!(scored[0].source, "aws-tags");
    }

    #[test]
    fn corroborated_edge_bonus_clamped() {
        let edges = vec![
            Edge::owns("alice", "repoA", 1.0, "aws-tags", ts(0)),
            Edge::owns("alice", "repoA", 1.0, "github-codeowners", ts(0)),
        ];
        let scored = scorer().score(edges);
        assert_eq!(scored[0].confidence, 1.0);
    }

    #[test]
    fn corroboration_tie_keeps_first_member() {
        let edges = vec![
            Edge::owns("alice", "repoA", 0.5, "x-source", ts(0)),
            Edge::owns("alice", "repoA", 0.5, "y-source", ts(0)),
        ];
        let scored = scorer().score(edges);
        assert_eq!(scored[0].source, "x-source");
    }

    #[test]
    fn distinct_pairs_keep_first_appearance_order() {
        let edges = vec![
            Edge::owns("bob", "repoB", 0.5, "aws-tags", ts(0)),
            Edge::owns("alice", "repoA", 0.5, "aws-tags", ts(0)),
            Edge::owns("bob", "repoB", 0.5, "github-codeowners", ts(0)),
        ];
        let scored = scorer().score(edges);
        let pairs: Vec<_> = scored.iter().map(|e| e.pair_key()).collect();
        assert_eq!(pairs, vec![("bob", "repoB"), ("alice", "repoA")]);
    }

    #[test]
    fn reversed_pair_is_a_different_group() {
        let edges = vec![
            Edge::owns("a", "b", 0.5, "aws-tags", ts(0)),
            Edge::owns("b", "a", 0.5, "aws-tags", ts(0)),
        ];
        assert_eq!(scorer().score(edges).len(), 2);
    }

    #[test]
    fn nan_raw_confidence_is_not_promoted_to_max() {
        let edge = Edge::owns("alice", "repoA", f64::NAN, "aws-tags", ts(0));
        assert!(scorer().single_score(&edge, now()).is_nan());

        let scored = scorer().score(vec![edge]);
        assert!(scored[0].confidence.is_nan());
    }

    #[test]
    fn nan_member_loses_to_finite_member() {
        let edges = vec![
            Edge::owns("alice", "repoA", f64::NAN, "aws-tags", ts(0)),
            Edge::owns("alice", "repoA", 0.5, "github-codeowners", ts(0)),
        ];
        let scored = scorer().score(edges);
        assert_eq!(scored[0].source, "github-codeowners");
        assert!(close(scored[0].confidence, 0.5 * 0.85 + 0.1));
    }

    #[test]
    fn scoring_config_validation() {
        assert!(ScoringConfig::default().validate().is_ok());
        let bad = ScoringConfig {
            decay_rate: -0.1,
            ..ScoringConfig::default()
        };
        assert!(bad.validate().is_err());
        let bad = ScoringConfig {
            agreement_bonus: f64::INFINITY,
            ..ScoringConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
