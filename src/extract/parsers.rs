//! Built-in payload parsers.
//!
//! Each parser understands exactly one source's payload shape. Payloads are
//! read entry by entry: an entry that does not match the expected shape is
//! skipped and the rest of the payload is still used.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::edge::Edge;
use crate::source::SourceRecord;

/// One CODEOWNERS rule.
#[derive(Debug, Deserialize)]
struct CodeownersEntry {
    path: String,
    owners: Vec<String>,
}

/// One OpenShift resource.
#[derive(Debug, Deserialize)]
struct OpenshiftResource {
    kind: String,
    name: String,
    #[serde(default)]
    owner: Option<String>,
}

/// One tagged AWS resource.
#[derive(Debug, Deserialize)]
struct AwsResource {
    arn: String,
    #[serde(default)]
    tags: Option<AwsTags>,
}

#[derive(Debug, Deserialize)]
struct AwsTags {
    #[serde(rename = "Owner", default)]
    owner: Option<String>,
}

/// `github-codeowners`: one edge per `(owner, path)`, `@` stripped.
pub fn github_codeowners(record: &SourceRecord) -> Vec<Edge> {
    let mut edges = Vec::new();
    for entry in entries::<CodeownersEntry>(record, "entries") {
        if entry.path.is_empty() {
            continue;
        }
        for owner in &entry.owners {
            let handle = owner.trim();
            let handle = handle.strip_prefix('@').unwrap_or(handle);
            if handle.is_empty() {
                continue;
            }
            edges.push(edge_for(record, handle, &entry.path));
        }
    }
    edges
}

/// `openshift-metadata`: `owner -> kind/name` when an owner is set.
pub fn openshift_metadata(record: &SourceRecord) -> Vec<Edge> {
    entries::<OpenshiftResource>(record, "resources")
        .filter(|res| !res.kind.is_empty() && !res.name.is_empty())
        .filter_map(|res| {
            let owner = res.owner.as_deref().map(str::trim).filter(|o| !o.is_empty())?;
            Some(edge_for(record, owner, &format!("{}/{}", res.kind, res.name)))
        })
        .collect()
}

/// `aws-tags`: `Owner tag -> arn` when the tag is present.
pub fn aws_tags(record: &SourceRecord) -> Vec<Edge> {
    entries::<AwsResource>(record, "resources")
        .filter(|res| !res.arn.is_empty())
        .filter_map(|res| {
            let owner = res
                .tags
                .as_ref()
                .and_then(|tags| tags.owner.as_deref())
                .map(str::trim)
                .filter(|o| !o.is_empty())?;
            Some(edge_for(record, owner, &res.arn))
        })
        .collect()
}

fn edge_for(record: &SourceRecord, owner: &str, target: &str) -> Edge {
    Edge::owns(
        owner,
        target,
        record.confidence,
        record.source.clone(),
        record.timestamp.clone(),
    )
}

/// The list of entries in a payload: either `{ "<field>": [...] }` or a bare
/// array. Entries that fail to deserialize are logged and skipped.
fn entries<'a, T>(record: &'a SourceRecord, field: &'static str) -> impl Iterator<Item = T> + 'a
where
    T: DeserializeOwned + 'a,
{
    let list: &[Value] = match &record.data {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get(field) {
            Some(Value::Array(items)) => items.as_slice(),
            _ => {
                tracing::debug!(source = %record.source, field, "payload has no entry list");
                &[]
            }
        },
        _ => {
            tracing::debug!(source = %record.source, "payload is neither an object nor an array");
            &[]
        }
    };

    list.iter().enumerate().filter_map(move |(index, raw)| {
        match T::deserialize(raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(source = %record.source, index, error = %e, "skipping malformed entry");
                None
            }
        }
    })
}
