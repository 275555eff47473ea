//! Builders for repository protocol headers.
//!
//! Every generation-dependent header value is produced here, so the
//! Fedora 5 / Fedora 6 split is decided in one place.

use crate::config::RepositoryGeneration;
use crate::error::{SyncError, SyncResult};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, LINK};

/// Conditional-write header carrying the concurrency token.
pub const IF_STATE_MATCH: HeaderName = HeaderName::from_static("x-if-state-match");

/// Response header the repository reports its state token in.
pub const STATE_TOKEN: HeaderName = HeaderName::from_static("x-state-token");

pub const PREFER: HeaderName = HeaderName::from_static("prefer");

pub const MEMENTO_DATETIME: HeaderName = HeaderName::from_static("memento-datetime");

pub const EXTERNAL_CONTENT_REL: &str = "http://fedora.info/definitions/fcrepo#ExternalContent";

const SERVER_MANAGED_OMIT: &str =
    "return=representation; omit=\"http://fedora.info/definitions/v4/repository#ServerManaged\"";

fn jsonld() -> HeaderValue {
    HeaderValue::from_static("application/ld+json")
}

/// Headers for creating a resource from a linked-data document.
pub fn create_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, jsonld());
    headers.insert(PREFER, HeaderValue::from_static("return=minimal; handling=lenient"));
    headers
}

/// Headers for reading the repository copy before an update.
pub fn read_headers(generation: RepositoryGeneration) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, jsonld());
    if generation == RepositoryGeneration::Fedora6 {
        headers.insert(PREFER, HeaderValue::from_static(SERVER_MANAGED_OMIT));
    }
    headers
}

/// Headers for overwriting a resource, conditional on `token` when present.
pub fn update_headers(
    generation: RepositoryGeneration,
    token: Option<&ConcurrencyToken>,
) -> HeaderMap {
    let prefer = match generation {
        RepositoryGeneration::Fedora6 => "handling=lenient",
        RepositoryGeneration::Fedora5 => "handling=lenient;received=minimal",
    };

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, jsonld());
    headers.insert(PREFER, HeaderValue::from_static(prefer));
    if let Some(token) = token {
        headers.insert(IF_STATE_MATCH, token.header_value().clone());
    }
    headers
}

/// `Link` header registering `url` as redirect-handled external content.
pub fn external_content_headers(url: &str, mime_type: &str) -> SyncResult<HeaderMap> {
    let link = format!(
        "<{url}>; rel=\"{EXTERNAL_CONTENT_REL}\"; handling=\"redirect\"; type=\"{mime_type}\""
    );
    let mut headers = HeaderMap::new();
    headers.insert(LINK, encode(LINK.as_str(), &link)?);
    Ok(headers)
}

/// `Memento-Datetime` header for a snapshot taken at `at`.
pub fn memento_headers(at: DateTime<Utc>) -> SyncResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        MEMENTO_DATETIME,
        encode(MEMENTO_DATETIME.as_str(), &rfc1123(at))?,
    );
    Ok(headers)
}

/// Formats a timestamp as an RFC-1123 HTTP date.
pub fn rfc1123(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Drops parameters from a media type (`image/jpeg; charset=binary` -> `image/jpeg`).
pub fn strip_media_type_params(content_type: &str) -> &str {
    content_type
        .split_once(';')
        .map_or(content_type, |(essence, _)| essence)
        .trim()
}

fn encode(name: &str, value: &str) -> SyncResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| SyncError::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

/// The repository's version of a resource at read time.
///
/// Only valid for a write issued immediately after the read, on the same
/// resource. A stale token makes the repository reject the write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcurrencyToken {
    value: String,
    header: HeaderValue,
}

impl ConcurrencyToken {
    /// Captures the token from a response, if the repository sent one.
    ///
    /// A weak-validator prefix is stripped and the value is quoted.
    pub fn from_headers(headers: &HeaderMap) -> SyncResult<Option<Self>> {
        let Some(raw) = headers.get(STATE_TOKEN) else {
            return Ok(None);
        };
        let raw = raw.to_str().map_err(|e| SyncError::InvalidHeader {
            name: STATE_TOKEN.to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(raw).map(Some)
    }

    /// Normalizes a raw token value.
    pub fn parse(raw: &str) -> SyncResult<Self> {
        let bare = raw.trim();
        let bare = bare.strip_prefix("W/").unwrap_or(bare).trim_matches('"');
        let value = format!("\"{bare}\"");
        let header = encode(IF_STATE_MATCH.as_str(), &value)?;
        Ok(Self { value, header })
    }

    /// The quoted token value.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    fn header_value(&self) -> &HeaderValue {
        &self.header
    }
}
