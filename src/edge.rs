//! Canonical relationship edges.
//!
//! An [`Edge`] is the unit every pipeline stage consumes and produces: a
//! `from --type--> to` assertion carrying the trust score assigned to it and
//! the provenance of the source that asserted it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Relation type emitted by every built-in extractor.
pub const OWNS: &str = "owns";

/// A canonical `from --type--> to` relationship.
///
/// Edges are plain values. The extractor creates them with the source's raw
/// confidence, the scorer replaces `confidence`, and the resolver sets
/// `has_conflict` on the winner of a disputed target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Owner identifier (user handle, team name).
    pub from: String,

    /// Target identifier (resource path, `kind/name`, ARN).
    pub to: String,

    /// Relation type; currently always [`OWNS`].
    #[serde(rename = "type")]
    pub relation: String,

    /// Trust score. Clamped above at 1.0 by the scorer, never floored.
    pub confidence: f64,

    /// Identifier of the source that asserted this edge.
    pub source: String,

    /// Capture time of the asserting record, as supplied (RFC 3339).
    pub timestamp: String,

    /// Set on the surviving edge of a disputed target.
    #[serde(rename = "hasConflict", default)]
    pub has_conflict: bool,
}

impl Edge {
    /// Creates an `owns` edge.
    #[must_use]
    pub fn owns(
        from: impl Into<String>,
        to: impl Into<String>,
        confidence: f64,
        source: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            relation: OWNS.to_string(),
            confidence,
            source: source.into(),
            timestamp: timestamp.into(),
            has_conflict: false,
        }
    }

    /// Returns the `(from, to)` key the scorer groups on.
    #[must_use]
    pub fn pair_key(&self) -> (&str, &str) {
        (&self.from, &self.to)
    }

    /// Returns true if every identifying field is non-empty.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        !self.from.is_empty()
            && !self.to.is_empty()
            && !self.relation.is_empty()
            && !self.source.is_empty()
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -{}-> {} ({:.3}, {})",
            self.from, self.relation, self.to, self.confidence, self.source
        )?;
        if self.has_conflict {
            write!(f, " [conflict]")?;
        }
        Ok(())
    }
}
