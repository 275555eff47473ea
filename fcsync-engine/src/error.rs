//! Error types for the sync layer.

use reqwest::StatusCode;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while synchronizing the repository.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Identifier too short to map to a pairtree path.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Empty repository path.
    #[error("invalid repository path")]
    InvalidPath,

    /// The event lacks a field the selected action needs.
    #[error("missing event field: {0}")]
    MissingEventField(String),

    /// A header value could not be encoded.
    #[error("invalid header value for {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("cannot parse 'alternate' link header from response to GET {0}")]
    MissingAlternateLink(String),

    #[error("cannot parse 'describes' link header from response to GET {0}")]
    MissingDescribesLink(String),

    #[error("cannot parse 'describedby' link header from response to HEAD {0}")]
    MissingDescribedByLink(String),

    /// The media description has no usable file reference.
    #[error("missing file reference: {0}")]
    MissingFileReference(String),

    /// Linked-data document without a usable graph.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("no @graph entry matched subject {0}")]
    NoMatchingSubject(String),

    #[error("malformed timestamp {value:?}: {reason}")]
    MalformedTimestamp { value: String, reason: String },

    #[error("predicate {0} not found")]
    PredicateNotFound(String),

    /// The HTTP client could not be set up.
    #[error("failed to create HTTP client: {0}")]
    ClientBuild(String),

    /// A request could not be completed at the transport level.
    #[error("upstream unavailable: {url}: {reason}")]
    UpstreamUnavailable { url: String, reason: String },

    /// The source system answered with an unexpected status.
    #[error("source {url} returned {status}")]
    SourceFetchFailed { url: String, status: u16 },

    /// The repository refused to serve its copy of a resource.
    #[error("{method} {url} returned {status}: {body}")]
    RepositoryReadFailed {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    /// The repository refused a write.
    #[error("{method} {url} returned {status}: {body}")]
    RepositoryWriteRejected {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    /// The source copy is not newer than the repository copy.
    #[error("not updating {repository_url} because RDF at {source_url} is not newer")]
    NotNewer {
        repository_url: String,
        source_url: String,
    },

    #[error("POST {url} returned {status}: {body}")]
    VersioningFailed { url: String, status: u16, body: String },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SyncError {
    /// Outward HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidIdentifier(_)
            | Self::InvalidPath
            | Self::MissingEventField(_)
            | Self::InvalidHeader { .. } => StatusCode::BAD_REQUEST,

            Self::MissingAlternateLink(_)
            | Self::MissingDescribesLink(_)
            | Self::MissingDescribedByLink(_)
            | Self::MissingFileReference(_)
            | Self::UpstreamUnavailable { .. }
            | Self::SourceFetchFailed { .. } => StatusCode::BAD_GATEWAY,

            Self::MalformedDocument(_)
            | Self::NoMatchingSubject(_)
            | Self::MalformedTimestamp { .. }
            | Self::PredicateNotFound(_)
            | Self::ClientBuild(_)
            | Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,

            Self::NotNewer { .. } => StatusCode::PRECONDITION_FAILED,

            Self::RepositoryReadFailed { status, .. }
            | Self::RepositoryWriteRejected { status, .. }
            | Self::VersioningFailed { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
        }
    }

    /// Returns true if this error means "already up to date".
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::NotNewer { .. })
    }

    /// Body returned to the transport layer for this error.
    ///
    /// Repository rejections pass the repository's own body through.
    pub fn response_body(&self) -> String {
        match self {
            Self::RepositoryReadFailed { body, .. }
            | Self::RepositoryWriteRejected { body, .. }
            | Self::VersioningFailed { body, .. }
                if !body.is_empty() =>
            {
                body.clone()
            }
            _ => self.to_string(),
        }
    }

    pub(crate) fn unavailable(url: &str, err: impl std::fmt::Display) -> Self {
        Self::UpstreamUnavailable {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<fcsync_types::Error> for SyncError {
    fn from(err: fcsync_types::Error) -> Self {
        match err {
            fcsync_types::Error::InvalidIdentifier { .. } => {
                Self::InvalidIdentifier(err.to_string())
            }
            fcsync_types::Error::InvalidPath => Self::InvalidPath,
            fcsync_types::Error::Serialization(e) => Self::Serialization(e),
        }
    }
}
