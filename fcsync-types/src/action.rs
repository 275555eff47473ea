//! Classification of events into sync actions.

use crate::event::{Event, MEDIA_TYPE_JSON, MEDIA_TYPE_JSONLD};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of things the sync core can do with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// Remove the resource from the repository.
    Delete,
    /// Create or update a described resource from its linked-data form.
    NodeIndex,
    /// Update the description of a derivative file.
    MediaIndex,
    /// Register a by-reference binary.
    ExternalIndex,
    /// Nothing to do for this consumer.
    Unknown,
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Delete => "delete",
            Self::NodeIndex => "node_index",
            Self::MediaIndex => "media_index",
            Self::ExternalIndex => "external_index",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Decides what to do with an event. First match wins:
///
/// 1. `Delete` when the type or summary mentions "delete"
/// 2. `ExternalIndex` when the summary mentions "external"
/// 3. `MediaIndex` when a source field is attached and a JSON link exists
/// 4. `NodeIndex` when a JSON-LD link exists
/// 5. `Unknown` otherwise
///
/// String matching is case-insensitive.
pub fn classify(event_type: &str, summary: &str, event: &Event) -> EventAction {
    let event_type = event_type.to_lowercase();
    let summary = summary.to_lowercase();

    if event_type.contains("delete") || summary.contains("delete") {
        return EventAction::Delete;
    }

    if summary.contains("external") {
        return EventAction::ExternalIndex;
    }

    if event.source_field().is_some() && event.find_url_by_media_type(MEDIA_TYPE_JSON).is_some()
    {
        return EventAction::MediaIndex;
    }

    if event.find_url_by_media_type(MEDIA_TYPE_JSONLD).is_some() {
        return EventAction::NodeIndex;
    }

    EventAction::Unknown
}
