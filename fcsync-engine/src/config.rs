//! Sync configuration.

use serde::{Deserialize, Serialize};

/// Which repository generation the headers are written for.
///
/// This is a static deployment setting, never detected at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryGeneration {
    Fedora5,
    #[default]
    Fedora6,
}

/// Configuration for the sync engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Repository base URL, used when an event carries no target.
    pub repository_url: String,
    /// Predicate holding the modified date in linked-data documents.
    pub modified_predicate: String,
    /// Strip a trailing `?_format=jsonld` from source URLs before subject matching.
    pub strip_format_jsonld: bool,
    /// Header variant to use for repository writes.
    pub generation: RepositoryGeneration,
    /// Upper bound on any single outbound request (seconds).
    pub request_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            repository_url: "http://fcrepo:8080/fcrepo/rest".to_string(),
            modified_predicate: "http://schema.org/dateModified".to_string(),
            strip_format_jsonld: true,
            generation: RepositoryGeneration::Fedora6,
            request_timeout_secs: 60,
        }
    }
}

impl SyncConfig {
    pub const ENV_REPOSITORY_URL: &'static str = "FCREPO_INDEXER_FEDORA_URL";
    pub const ENV_MODIFIED_PREDICATE: &'static str = "FCREPO_INDEXER_MODIFIED_PREDICATE";
    pub const ENV_STRIP_FORMAT_JSONLD: &'static str = "FCREPO_INDEXER_STRIP_FORMAT_JSONLD";
    pub const ENV_IS_FEDORA6: &'static str = "FCREPO_INDEXER_IS_FEDORA6";
    pub const ENV_TIMEOUT_SECS: &'static str = "FCREPO_INDEXER_TIMEOUT_SECS";

    /// Reads configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from a key lookup. Unset or empty keys keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let generation = match get(Self::ENV_IS_FEDORA6) {
            Some(v) if parse_bool(&v) => RepositoryGeneration::Fedora6,
            Some(_) => RepositoryGeneration::Fedora5,
            None => defaults.generation,
        };

        Self {
            repository_url: get(Self::ENV_REPOSITORY_URL).unwrap_or(defaults.repository_url),
            modified_predicate: get(Self::ENV_MODIFIED_PREDICATE)
                .unwrap_or(defaults.modified_predicate),
            strip_format_jsonld: get(Self::ENV_STRIP_FORMAT_JSONLD)
                .map_or(defaults.strip_format_jsonld, |v| parse_bool(&v)),
            generation,
            request_timeout_secs: get(Self::ENV_TIMEOUT_SECS)
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
        }
    }

    /// Returns true when writes target a Fedora 6 repository.
    pub fn is_fedora6(&self) -> bool {
        self.generation == RepositoryGeneration::Fedora6
    }
}

fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}
