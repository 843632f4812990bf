//! Source records and built-in source identifiers.
//!
//! Every edge traces back to exactly one [`SourceRecord`]: the raw payload a
//! scraper produced, the scraper's own a-priori confidence, and when the data
//! was captured. Records are owned by the caller and read, never mutated.

use serde::{Deserialize, Serialize};

/// GitHub CODEOWNERS scraper.
pub const GITHUB_CODEOWNERS: &str = "github-codeowners";

/// OpenShift resource metadata scraper.
pub const OPENSHIFT_METADATA: &str = "openshift-metadata";

/// AWS resource tag scanner.
pub const AWS_TAGS: &str = "aws-tags";

/// GitHub commit/PR activity heuristics.
pub const GITHUB_ACTIVITY: &str = "github-activity";

/// Datadog service catalog.
pub const DATADOG_SERVICE: &str = "datadog-service";

/// One scraped payload.
///
/// # Examples
///
/// ```
/// use ownership_reconcile::SourceRecord;
/// use serde_json::json;
///
/// let record = SourceRecord::new(
///     "aws-tags",
///     json!({ "resources": [{ "arn": "arn:aws:s3:::logs", "tags": { "Owner": "alice" } }] }),
///     0.8,
///     "2024-05-01T12:00:00Z",
/// );
/// assert_eq!(record.source, "aws-tags");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Identifier of the producing scraper; selects the payload parser.
    pub source: String,

    /// Opaque, source-specific payload.
    #[serde(default)]
    pub data: serde_json::Value,

    /// Confidence the scraper assigned to its own output.
    ///
    /// Not validated: out-of-range values flow through unchanged.
    pub confidence: f64,

    /// Capture time (RFC 3339). Kept verbatim; parsed only for freshness.
    #[serde(default)]
    pub timestamp: String,
}

impl SourceRecord {
    /// Creates a record.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        data: serde_json::Value,
        confidence: f64,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            data,
            confidence,
            timestamp: timestamp.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_source_record_deserialize() {
        let record: SourceRecord = serde_json::from_value(json!({
            "source": "github-codeowners",
            "data": { "entries": [] },
            "confidence": 0.9,
            "timestamp": "2024-05-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(record.source, GITHUB_CODEOWNERS);
        assert!((record.confidence - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_source_record_missing_optional_fields() {
        let record: SourceRecord =
            serde_json::from_value(json!({ "source": "custom", "confidence": 1.5 })).unwrap();
        assert!(record.data.is_null());
        assert!(record.timestamp.is_empty());
        // Out-of-range confidence is carried as-is.
        assert!((record.confidence - 1.5).abs() < f64::EPSILON);
    }
}
