//! Linked-data graph filtering and timestamp extraction.

use crate::error::{SyncError, SyncResult};
use chrono::DateTime;
use reqwest::Url;
use serde_json::Value;
use tracing::debug;

const GRAPH_KEY: &str = "@graph";
const ID_KEY: &str = "@id";
const VALUE_KEY: &str = "@value";

/// Keeps only the `@graph` entries describing `source_subject` and
/// rewrites their `@id` to `new_subject`.
///
/// Subjects are compared by host and path, so `http` and `https` forms of
/// the same URL match. Entries keep their original order.
pub fn filter_and_rewrite(
    document: &Value,
    source_subject: &str,
    new_subject: &str,
) -> SyncResult<Vec<Value>> {
    let graph = document
        .get(GRAPH_KEY)
        .ok_or_else(|| SyncError::MalformedDocument("no @graph key in JSON-LD".to_string()))?
        .as_array()
        .ok_or_else(|| SyncError::MalformedDocument("@graph is not an array".to_string()))?;

    let wanted = host_path(source_subject).ok_or_else(|| {
        SyncError::MalformedDocument(format!("cannot parse subject URL {source_subject}"))
    })?;
    debug!(source_subject, new_subject, %wanted, "filtering JSON-LD graph");

    let filtered: Vec<Value> = graph
        .iter()
        .filter(|entry| {
            entry
                .get(ID_KEY)
                .and_then(Value::as_str)
                .and_then(host_path)
                .is_some_and(|id| id == wanted)
        })
        .map(|entry| {
            let mut entry = entry.clone();
            entry[ID_KEY] = Value::String(new_subject.to_string());
            entry
        })
        .collect();

    if filtered.is_empty() {
        return Err(SyncError::NoMatchingSubject(source_subject.to_string()));
    }
    Ok(filtered)
}

/// Same as [`filter_and_rewrite`] on raw bytes.
pub fn filter_and_rewrite_bytes(
    document: &[u8],
    source_subject: &str,
    new_subject: &str,
) -> SyncResult<Vec<Value>> {
    let document: Value = serde_json::from_slice(document)
        .map_err(|e| SyncError::MalformedDocument(format!("failed to parse JSON-LD: {e}")))?;
    filter_and_rewrite(&document, source_subject, new_subject)
}

/// Reads the first `@value` of `predicate` on the first resource and
/// returns it as Unix seconds.
pub fn extract_modified_timestamp(resources: &[Value], predicate: &str) -> SyncResult<i64> {
    let first = resources
        .first()
        .ok_or_else(|| SyncError::MalformedDocument("empty JSON-LD array".to_string()))?;

    let raw = first
        .get(predicate)
        .and_then(Value::as_array)
        .and_then(|values| values.first())
        .and_then(|value| value.get(VALUE_KEY))
        .and_then(Value::as_str)
        .ok_or_else(|| SyncError::PredicateNotFound(predicate.to_string()))?;

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.timestamp())
        .map_err(|e| SyncError::MalformedTimestamp {
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

/// Host (with port, if any) followed by path. `None` if unparseable.
fn host_path(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}{}", url.path()),
        None => format!("{host}{}", url.path()),
    })
}
