//! In-memory edge sink.
//!
//! Reference implementation of the [`EdgeSink`] upsert contract, used by the
//! host binary, dry runs and tests.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::edge::Edge;
use crate::storage::traits::{EdgeSink, SinkError};

fn lock_err(context: &'static str) -> SinkError {
    SinkError::Backend(format!("poisoned lock: {context}"))
}

/// Upsert key: `(to, from, type)`, so listings come out grouped by target.
type EdgeKey = (String, String, String);

fn key_of(edge: &Edge) -> EdgeKey {
    (edge.to.clone(), edge.from.clone(), edge.relation.clone())
}

#[derive(Debug, Default)]
struct SinkState {
    edges: BTreeMap<EdgeKey, Edge>,
    batches: u64,
}

/// Thread-safe in-memory edge store.
#[derive(Debug, Default)]
pub struct InMemoryEdgeSink {
    state: RwLock<SinkState>,
}

impl InMemoryEdgeSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored edges, ordered by target then owner.
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Backend` if the lock is poisoned.
    pub fn edges(&self) -> Result<Vec<Edge>, SinkError> {
        let state = self.state.read().map_err(|_| lock_err("edges"))?;
        Ok(state.edges.values().cloned().collect())
    }

    /// Looks up one stored edge.
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Backend` if the lock is poisoned.
    pub fn get(&self, from: &str, to: &str, relation: &str) -> Result<Option<Edge>, SinkError> {
        let state = self.state.read().map_err(|_| lock_err("get"))?;
        let key = (to.to_string(), from.to_string(), relation.to_string());
        Ok(state.edges.get(&key).cloned())
    }

    /// Number of stored edges.
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Backend` if the lock is poisoned.
    pub fn len(&self) -> Result<usize, SinkError> {
        let state = self.state.read().map_err(|_| lock_err("len"))?;
        Ok(state.edges.len())
    }

    /// Returns true if nothing has been stored.
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Backend` if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, SinkError> {
        Ok(self.len()? == 0)
    }

    /// Number of batches committed so far.
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Backend` if the lock is poisoned.
    pub fn batches(&self) -> Result<u64, SinkError> {
        let state = self.state.read().map_err(|_| lock_err("batches"))?;
        Ok(state.batches)
    }
}

impl EdgeSink for InMemoryEdgeSink {
    fn persist(&self, edges: &[Edge]) -> Result<(), SinkError> {
        // Validate the whole batch before touching state.
        if let Some(bad) = edges.iter().find(|e| !e.is_well_formed()) {
            return Err(SinkError::Rejected {
                edge: bad.to_string(),
                reason: "edge has an empty identifier".to_string(),
            });
        }

        let mut state = self.state.write().map_err(|_| lock_err("persist"))?;
        for edge in edges {
            state.edges.insert(key_of(edge), edge.clone());
        }
        state.batches += 1;
        Ok(())
    }
}
