//! Pairtree addressing.
//!
//! The repository shards resources by the leading characters of their
//! identifier: the first eight characters become four two-character
//! directories, and the full identifier is the leaf.
//!
//! `9541c0c1-5bee-4973-a93a-69b3c1a1f906` maps to
//! `95/41/c0/c1/9541c0c1-5bee-4973-a93a-69b3c1a1f906`.

use crate::{Error, Result};

/// Number of leading characters split into directory segments.
pub const PREFIX_LEN: usize = 8;

const SEGMENT_LEN: usize = 2;

/// Maps an identifier to its repository path.
pub fn to_path(identifier: &str) -> Result<String> {
    let prefix: Vec<char> = identifier.chars().take(PREFIX_LEN).collect();
    if prefix.len() < PREFIX_LEN {
        return Err(Error::InvalidIdentifier {
            len: identifier.chars().count(),
            min: PREFIX_LEN,
        });
    }

    let mut path = String::with_capacity(identifier.len() + PREFIX_LEN / SEGMENT_LEN * 3 + 1);
    for segment in prefix.chunks(SEGMENT_LEN) {
        path.extend(segment);
        path.push('/');
    }
    path.push_str(identifier);
    Ok(path)
}

/// Recovers the identifier from a repository path (its last segment).
pub fn to_identifier(path: &str) -> Result<&str> {
    if path.is_empty() {
        return Err(Error::InvalidPath);
    }
    Ok(path.rsplit('/').next().unwrap_or(path))
}

/// Joins a repository base URL and the pairtree path of an identifier.
pub fn resource_url(base_url: &str, identifier: &str) -> Result<String> {
    let path = to_path(identifier)?;
    Ok(format!("{}/{}", base_url.trim_end_matches('/'), path))
}
