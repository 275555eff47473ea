//! Shared fixtures for repository protocol tests.

#![allow(dead_code)]

use fcsync_engine::{RepositoryClient, RepositoryGeneration, SyncConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::{MockServer, Request};

pub const NODE_ID: &str = "9541c0c1-5bee-4973-a93a-69b3c1a1f906";
pub const NODE_PATH: &str = "/95/41/c0/c1/9541c0c1-5bee-4973-a93a-69b3c1a1f906";
pub const MODIFIED: &str = "http://schema.org/dateModified";
pub const T0: &str = "2024-01-15T10:30:00+00:00";
pub const T0_PLUS_1: &str = "2024-01-15T10:30:01+00:00";

pub fn config(server: &MockServer) -> Arc<SyncConfig> {
    Arc::new(SyncConfig {
        repository_url: server.uri(),
        request_timeout_secs: 5,
        ..Default::default()
    })
}

pub fn fedora5_config(server: &MockServer) -> Arc<SyncConfig> {
    Arc::new(SyncConfig {
        generation: RepositoryGeneration::Fedora5,
        ..(*config(server)).clone()
    })
}

pub fn client(config: &SyncConfig) -> RepositoryClient {
    RepositoryClient::new(config).unwrap()
}

pub fn repository_url(server: &MockServer) -> String {
    format!("{}{NODE_PATH}", server.uri())
}

/// `(source url, subject url)` of node 1 on the mock source system.
pub fn source_urls(server: &MockServer) -> (String, String) {
    let subject = format!("{}/node/1", server.uri());
    (format!("{subject}?_format=jsonld"), subject)
}

/// A source document describing `subject` plus one unrelated resource.
pub fn source_document(subject: &str, modified: &str) -> Value {
    json!({
        "@graph": [
            {
                "@id": subject,
                "@type": ["http://schema.org/Thing"],
                MODIFIED: [{"@value": modified, "@type": "http://www.w3.org/2001/XMLSchema#dateTime"}],
                "http://purl.org/dc/terms/title": [{"@value": "Test node"}]
            },
            {
                "@id": "http://other.test/taxonomy/term/3",
                "http://schema.org/name": [{"@value": "Unrelated"}]
            }
        ]
    })
}

/// The repository's copy of a resource, as served on GET.
pub fn repository_copy(repository_url: &str, modified: &str) -> Value {
    json!([
        {
            "@id": repository_url,
            MODIFIED: [{"@value": modified}]
        }
    ])
}

pub async fn requests_with_method(server: &MockServer, verb: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|req| req.method.as_str() == verb)
        .collect()
}

pub fn header<'a>(req: &'a Request, name: &str) -> Option<&'a str> {
    req.headers.get(name).and_then(|v| v.to_str().ok())
}
