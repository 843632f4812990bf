//! Source trust tables.
//!
//! Two independent, read-only lookups describe how much each source is
//! trusted:
//!
//! - [`SourceWeightTable`] scales a source's raw confidence during scoring.
//! - [`SourcePriorityTable`] ranks sources when owners disagree (lower wins).
//!
//! Both tables answer for any identifier: unknown sources get a documented
//! default instead of an error.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::source::{AWS_TAGS, DATADOG_SERVICE, GITHUB_ACTIVITY, GITHUB_CODEOWNERS, OPENSHIFT_METADATA};

/// Reliability weight in [0.0, 1.0] per source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceWeightTable {
    weights: HashMap<String, f64>,
}

impl SourceWeightTable {
    /// Weight applied to sources missing from the table.
    pub const DEFAULT_WEIGHT: f64 = 0.5;

    /// Creates an empty table; every lookup yields [`Self::DEFAULT_WEIGHT`].
    #[must_use]
    pub fn empty() -> Self {
        Self {
            weights: HashMap::new(),
        }
    }

    /// Builds a validated table.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptySourceId` for a blank identifier and
    /// `ValidationError::WeightOutOfRange` for a weight outside [0.0, 1.0].
    pub fn new<I, S>(entries: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let table = Self {
            weights: entries.into_iter().map(|(s, w)| (s.into(), w)).collect(),
        };
        table.validate()?;
        Ok(table)
    }

    /// Checks every configured weight.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (source_id, &value) in &self.weights {
            if source_id.trim().is_empty() {
                return Err(ValidationError::EmptySourceId);
            }
            if !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::WeightOutOfRange {
                    source_id: source_id.clone(),
                    value,
                });
            }
        }
        Ok(())
    }

    /// Weight for `source`, or [`Self::DEFAULT_WEIGHT`] when unconfigured.
    #[must_use]
    pub fn weight(&self, source: &str) -> f64 {
        self.weights
            .get(source)
            .copied()
            .unwrap_or(Self::DEFAULT_WEIGHT)
    }

    /// Returns true if `source` has an explicit weight.
    #[must_use]
    pub fn contains(&self, source: &str) -> bool {
        self.weights.contains_key(source)
    }

    /// Number of configured sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Returns true if no source is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl Default for SourceWeightTable {
    fn default() -> Self {
        let weights = [
            (AWS_TAGS, 0.9),
            (GITHUB_CODEOWNERS, 0.85),
            (OPENSHIFT_METADATA, 0.8),
            (DATADOG_SERVICE, 0.7),
            (GITHUB_ACTIVITY, 0.6),
        ];
        Self {
            weights: weights
                .into_iter()
                .map(|(s, w)| (s.to_string(), w))
                .collect(),
        }
    }
}

/// Conflict priority per source. Lower values are more trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourcePriorityTable {
    priorities: HashMap<String, u32>,
}

impl SourcePriorityTable {
    /// Priority of sources missing from the table.
    ///
    /// Above any configured value, so an unknown source never wins a
    /// conflict against a known one.
    pub const UNKNOWN_PRIORITY: u32 = 999;

    /// Creates an empty table; every lookup yields [`Self::UNKNOWN_PRIORITY`].
    #[must_use]
    pub fn empty() -> Self {
        Self {
            priorities: HashMap::new(),
        }
    }

    /// Builds a validated table.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptySourceId` for a blank identifier and
    /// `ValidationError::PriorityOutOfRange` for a priority at or above
    /// [`Self::UNKNOWN_PRIORITY`].
    pub fn new<I, S>(entries: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let table = Self {
            priorities: entries.into_iter().map(|(s, p)| (s.into(), p)).collect(),
        };
        table.validate()?;
        Ok(table)
    }

    /// Checks every configured entry.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (source_id, &value) in &self.priorities {
            if source_id.trim().is_empty() {
                return Err(ValidationError::EmptySourceId);
            }
            if value >= Self::UNKNOWN_PRIORITY {
                return Err(ValidationError::PriorityOutOfRange {
                    source_id: source_id.clone(),
                    value,
                    limit: Self::UNKNOWN_PRIORITY,
                });
            }
        }
        Ok(())
    }

    /// Priority for `source`, or [`Self::UNKNOWN_PRIORITY`] when unconfigured.
    #[must_use]
    pub fn priority(&self, source: &str) -> u32 {
        self.priorities
            .get(source)
            .copied()
            .unwrap_or(Self::UNKNOWN_PRIORITY)
    }

    /// Returns true if `source` has an explicit priority.
    #[must_use]
    pub fn contains(&self, source: &str) -> bool {
        self.priorities.contains_key(source)
    }

    /// Number of configured sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.priorities.len()
    }

    /// Returns true if no source is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.priorities.is_empty()
    }
}

impl Default for SourcePriorityTable {
    fn default() -> Self {
        let priorities = [
            (AWS_TAGS, 1),
            (GITHUB_CODEOWNERS, 2),
            (OPENSHIFT_METADATA, 3),
            (GITHUB_ACTIVITY, 4),
            (DATADOG_SERVICE, 5),
        ];
        Self {
            priorities: priorities
                .into_iter()
                .map(|(s, p)| (s.to_string(), p))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights() {
        let table = SourceWeightTable::default();
        assert_eq!(table.weight(AWS_TAGS), 0.9);
        assert_eq!(table.weight(GITHUB_ACTIVITY), 0.6);
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn unknown_source_gets_default_weight() {
        let table = SourceWeightTable::default();
        assert!(!table.contains("pagerduty"));
        assert_eq!(table.weight("pagerduty"), SourceWeightTable::DEFAULT_WEIGHT);
        assert_eq!(SourceWeightTable::empty().weight(AWS_TAGS), 0.5);
    }

    #[test]
    fn weight_out_of_range_rejected() {
        let err = SourceWeightTable::new([("aws-tags", 1.2)]).unwrap_err();
        assert!(matches!(err, ValidationError::WeightOutOfRange { .. }));
        assert!(SourceWeightTable::new([("aws-tags", f64::NAN)]).is_err());
        assert!(SourceWeightTable::new([("", 0.5)]).is_err());
    }

    #[test]
    fn default_priorities() {
        let table = SourcePriorityTable::default();
        assert_eq!(table.priority(AWS_TAGS), 1);
        assert_eq!(table.priority(GITHUB_ACTIVITY), 4);
    }

    #[test]
    fn unknown_source_never_outranks_configured() {
        let table = SourcePriorityTable::new([("slow-source", 500)]).unwrap();
        assert_eq!(table.priority("mystery"), SourcePriorityTable::UNKNOWN_PRIORITY);
        assert!(table.priority("slow-source") < table.priority("mystery"));
    }

    #[test]
    fn priority_at_or_above_unknown_rejected() {
        for value in [SourcePriorityTable::UNKNOWN_PRIORITY, 1500] {
            let err = SourcePriorityTable::new([("legacy-cmdb", value)]).unwrap_err();
            assert!(matches!(
                err,
                ValidationError::PriorityOutOfRange { value: v, .. } if v == value
            ));
        }
        assert!(SourcePriorityTable::new([("legacy-cmdb", 998)]).is_ok());
    }

    #[test]
    fn tables_deserialize_from_maps() {
        let weights: SourceWeightTable =
            serde_json::from_str(r#"{"aws-tags": 0.4}"#).unwrap();
        assert_eq!(weights.weight("aws-tags"), 0.4);

        let priorities: SourcePriorityTable =
            serde_json::from_str(r#"{"aws-tags": 7}"#).unwrap();
        assert_eq!(priorities.priority("aws-tags"), 7);
    }
}
