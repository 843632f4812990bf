//! Edge extraction.
//!
//! Maps each [`SourceRecord`] onto zero or more canonical [`Edge`]s through a
//! registry of `source id -> parser` entries. Adding a source means
//! registering one pure function; nothing else in the pipeline changes.
//!
//! Records from unregistered sources produce no edges. This is a permissive
//! policy, not an error.

pub mod parsers;

use std::collections::HashMap;
use std::fmt;

use crate::edge::Edge;
use crate::source::{SourceRecord, AWS_TAGS, GITHUB_CODEOWNERS, OPENSHIFT_METADATA};

/// A pure payload parser.
pub type ParseFn = fn(&SourceRecord) -> Vec<Edge>;

/// Dispatch table from source identifier to parser.
///
/// # Examples
///
/// ```
/// use ownership_reconcile::{ExtractorRegistry, SourceRecord};
/// use serde_json::json;
///
/// let registry = ExtractorRegistry::default();
/// let record = SourceRecord::new(
///     "github-codeowners",
///     json!({ "entries": [{ "path": "/api", "owners": ["@alice"] }] }),
///     0.9,
///     "2024-05-01T00:00:00Z",
/// );
/// let edges = registry.extract(&[record]);
/// assert_eq!(edges[0].from, "alice");
/// assert_eq!(edges[0].to, "/api");
/// ```
#[derive(Clone)]
pub struct ExtractorRegistry {
    parsers: HashMap<String, ParseFn>,
}

impl ExtractorRegistry {
    /// Creates a registry with no parsers.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Creates a registry holding the built-in parsers.
    #[must_use]
    pub fn builtin() -> Self {
        Self::empty()
            .with_parser(GITHUB_CODEOWNERS, parsers::github_codeowners)
            .with_parser(OPENSHIFT_METADATA, parsers::openshift_metadata)
            .with_parser(AWS_TAGS, parsers::aws_tags)
    }

    /// Registers `parser` for `source`, returning the parser it replaced.
    pub fn register(&mut self, source: impl Into<String>, parser: ParseFn) -> Option<ParseFn> {
        self.parsers.insert(source.into(), parser)
    }

    /// Builder form of [`Self::register`].
    #[must_use]
    pub fn with_parser(mut self, source: impl Into<String>, parser: ParseFn) -> Self {
        self.register(source, parser);
        self
    }

    /// Returns true if a parser is registered for `source`.
    #[must_use]
    pub fn supports(&self, source: &str) -> bool {
        self.parsers.contains_key(source)
    }

    /// Registered source identifiers, sorted.
    #[must_use]
    pub fn sources(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.parsers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Extracts edges from one record.
    ///
    /// Never emits an edge with an empty `from`, `to`, `type` or `source`.
    #[must_use]
    pub fn extract_record(&self, record: &SourceRecord) -> Vec<Edge> {
        if record.source.is_empty() {
            tracing::debug!("skipping record without a source identifier");
            return Vec::new();
        }
        let Some(parse) = self.parsers.get(&record.source) else {
            tracing::debug!(source = %record.source, "no parser registered, record ignored");
            return Vec::new();
        };

        let mut edges = parse(record);
        let before = edges.len();
        edges.retain(Edge::is_well_formed);
        if edges.len() < before {
            tracing::debug!(
                source = %record.source,
                dropped = before - edges.len(),
                "dropped incomplete edges"
            );
        }
        edges
    }

    /// Extracts edges from a batch, in record order then payload order.
    #[must_use]
    pub fn extract(&self, records: &[SourceRecord]) -> Vec<Edge> {
        records
            .iter()
            .flat_map(|record| self.extract_record(record))
            .collect()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorRegistry")
            .field("sources", &self.sources())
            .finish()
    }
}
