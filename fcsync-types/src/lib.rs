//! Core type definitions for fcsync.
//!
//! This crate defines the pure, I/O-free pieces of the repository sync core:
//! - The decoded change notification (`Event`) and its link list
//! - Action classification (`EventAction`, `classify`)
//! - Pairtree addressing between identifiers and repository paths
//!
//! Everything that talks to the network lives in `fcsync-engine`.

mod action;
mod event;
pub mod pairtree;

pub use action::{classify, EventAction};
pub use event::{
    Actor, Attachment, AttachmentContent, Event, EventObject, Link, MEDIA_TYPE_JSON,
    MEDIA_TYPE_JSONLD, URN_UUID_PREFIX,
};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("identifier must be at least {min} characters, got {len}")]
    InvalidIdentifier { len: usize, min: usize },

    #[error("empty repository path")]
    InvalidPath,
}
