//! Resolution records.
//!
//! The resolver is destructive by default: only the effective edge per
//! target survives. When the audit trail is enabled, each group that needed
//! a decision also yields a [`ResolutionRecord`] keeping the winner, the
//! superseded edges and how the choice was made.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::edge::Edge;

/// Unique identifier for a resolution record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolutionId(Uuid);

impl ResolutionId {
    /// Creates a new random ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ResolutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ResolutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a target needed a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    /// Distinct owners asserted for one target.
    Conflict,

    /// One owner asserted by several sources.
    Duplicate,
}

impl fmt::Display for ResolutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conflict => write!(f, "conflict"),
            Self::Duplicate => write!(f, "duplicate"),
        }
    }
}

/// How the winner was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ResolutionMethod {
    /// Most trusted source won.
    SourcePriority {
        /// Priority of the winning source.
        priority: u32,
    },

    /// Highest scored edge won.
    HighestConfidence {
        /// Confidence of the winning edge.
        confidence: f64,
    },
}

impl fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourcePriority { priority } => write!(f, "source_priority({priority})"),
            Self::HighestConfidence { confidence } => {
                write!(f, "highest_confidence({confidence:.2})")
            }
        }
    }
}

/// Audit entry for one resolved target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionRecord {
    /// Unique record identifier.
    pub id: ResolutionId,

    /// The contested target identifier.
    pub target: String,

    /// Whether owners disagreed or one owner was repeated.
    pub kind: ResolutionKind,

    /// The edge handed downstream.
    pub winner: Edge,

    /// Edges dropped in favour of the winner, in input order.
    pub superseded: Vec<Edge>,

    /// Rule that picked the winner.
    pub method: ResolutionMethod,

    /// When the decision was made.
    pub resolved_at: DateTime<Utc>,
}

impl ResolutionRecord {
    /// Creates a record stamped with `resolved_at`.
    #[must_use]
    pub fn new(
        kind: ResolutionKind,
        winner: Edge,
        superseded: Vec<Edge>,
        method: ResolutionMethod,
        resolved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ResolutionId::new(),
            target: winner.to.clone(),
            kind,
            winner,
            superseded,
            method,
            resolved_at,
        }
    }

    /// Returns true if distinct owners were involved.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.kind == ResolutionKind::Conflict
    }

    /// Distinct owners involved, winner first.
    #[must_use]
    pub fn owners(&self) -> Vec<&str> {
        let mut owners = vec![self.winner.from.as_str()];
        for edge in &self.superseded {
            if !owners.contains(&edge.from.as_str()) {
                owners.push(&edge.from);
            }
        }
        owners
    }

    /// Number of edges that took part, winner included.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.superseded.len() + 1
    }
}

impl PartialEq for ResolutionRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ResolutionRecord {}
