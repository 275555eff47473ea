//! Decoded change notifications.
//!
//! An `Event` is the activity message the source system emits whenever an
//! object is created, updated, deleted or versioned. The transport layer
//! decodes it once per notification; the sync core only reads it.
//!
//! Every field is optional on the wire. Missing values decode as empty so
//! that classification can treat "absent" and "empty" the same way.

use serde::{Deserialize, Serialize};

/// Prefix some object identifiers carry before the bare identifier.
pub const URN_UUID_PREFIX: &str = "urn:uuid:";

/// Media type of the source system's linked-data representation.
pub const MEDIA_TYPE_JSONLD: &str = "application/ld+json";

/// Media type of the source system's plain JSON representation.
pub const MEDIA_TYPE_JSON: &str = "application/json";

/// The entity that performed the change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Actor {
    pub id: String,
}

/// A hyperlink to one representation of the changed object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    pub name: String,
    #[serde(rename = "type")]
    pub link_type: String,
    pub href: String,
    #[serde(rename = "mediaType")]
    pub media_type: String,
    pub rel: String,
}

impl Link {
    /// Creates a link with the given href, media type and relation.
    pub fn new(
        href: impl Into<String>,
        media_type: impl Into<String>,
        rel: impl Into<String>,
    ) -> Self {
        Self {
            href: href.into(),
            media_type: media_type.into(),
            rel: rel.into(),
            ..Default::default()
        }
    }
}

/// The object the change applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventObject {
    pub id: String,
    pub url: Vec<Link>,
    #[serde(rename = "isNewVersion")]
    pub is_new_version: bool,
}

/// Derivative-specific details carried by media events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentContent {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source_mimetype: String,
    pub mimetype: String,
    pub args: String,
    pub source_uri: String,
    pub source_field: String,
    pub destination_uri: String,
    pub file_upload_uri: String,
}

/// Additional data attached to the notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub attachment_type: String,
    pub content: AttachmentContent,
    #[serde(rename = "mediaType")]
    pub media_type: String,
}

/// A decoded change notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    pub actor: Actor,
    pub object: EventObject,
    pub attachment: Attachment,
    /// Overrides the configured repository base URL when non-empty.
    pub target: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub summary: String,
    /// Bearer credential forwarded with the message, may be empty.
    pub authorization: String,
}

impl Event {
    /// Decodes an event from its JSON message form.
    pub fn from_json(bytes: &[u8]) -> crate::Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Returns the object identifier with any `urn:uuid:` prefix removed.
    pub fn object_id(&self) -> &str {
        self.object
            .id
            .strip_prefix(URN_UUID_PREFIX)
            .unwrap_or(&self.object.id)
    }

    /// Returns the source-system field holding a derivative file reference.
    pub fn source_field(&self) -> Option<&str> {
        let field = self.attachment.content.source_field.as_str();
        (!field.is_empty()).then_some(field)
    }

    /// Returns the href of the first link with the given media type.
    pub fn find_url_by_media_type(&self, media_type: &str) -> Option<&str> {
        self.object
            .url
            .iter()
            .find(|link| link.media_type == media_type)
            .map(|link| link.href.as_str())
    }

    /// Returns the href of the first link with the given relation.
    pub fn find_url_by_rel(&self, rel: &str) -> Option<&str> {
        self.object
            .url
            .iter()
            .find(|link| link.rel == rel)
            .map(|link| link.href.as_str())
    }

    /// Returns the repository base URL this event should be written to.
    pub fn target_or<'a>(&'a self, default: &'a str) -> &'a str {
        if self.target.is_empty() {
            default
        } else {
            &self.target
        }
    }

    /// Picks the credential for outbound calls: the transport's, falling
    /// back to the one carried in the message.
    pub fn credential_or<'a>(&'a self, transport: &'a str) -> &'a str {
        if transport.is_empty() {
            &self.authorization
        } else {
            transport
        }
    }
}
