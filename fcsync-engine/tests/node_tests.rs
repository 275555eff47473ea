mod common;

use common::*;
use fcsync_engine::{NodeSynchronizer, ResourceState, SyncError};
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::Value;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_source(server: &MockServer, modified: &str) {
    let (_, subject) = source_urls(server);
    Mock::given(method("GET"))
        .and(path("/node/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(source_document(&subject, modified)))
        .mount(server)
        .await;
}

async fn mount_repository_copy(server: &MockServer, modified: &str, token: Option<&str>) {
    let mut response = ResponseTemplate::new(200)
        .set_body_json(repository_copy(&repository_url(server), modified));
    if let Some(token) = token {
        response = response.insert_header("X-State-Token", token);
    }
    Mock::given(method("HEAD"))
        .and(path(NODE_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(NODE_PATH))
        .respond_with(response)
        .mount(server)
        .await;
}

fn synchronizer(server: &MockServer) -> NodeSynchronizer {
    let config = config(server);
    NodeSynchronizer::new(client(&config), config)
}

// ── existence ───────────────────────────────────────────────────

#[test]
fn only_404_means_absent() {
    assert_eq!(ResourceState::from_head_status(StatusCode::NOT_FOUND), ResourceState::Absent);
    assert_eq!(ResourceState::from_head_status(StatusCode::OK), ResourceState::Present);
    assert_eq!(ResourceState::from_head_status(StatusCode::GONE), ResourceState::Present);
    assert_eq!(
        ResourceState::from_head_status(StatusCode::INTERNAL_SERVER_ERROR),
        ResourceState::Present
    );
}

// ── create ──────────────────────────────────────────────────────

#[tokio::test]
async fn save_creates_missing_resource_with_filtered_graph() {
    let server = MockServer::start().await;
    mount_source(&server, T0).await;
    Mock::given(method("HEAD"))
        .and(path(NODE_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(NODE_PATH))
        .and(header("content-type", "application/ld+json"))
        .and(header("prefer", "return=minimal; handling=lenient"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let (source, _) = source_urls(&server);
    let status = synchronizer(&server)
        .save(&source, &repository_url(&server), Some("Bearer islandora"))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::CREATED);

    let puts = requests_with_method(&server, "PUT").await;
    let body: Vec<Value> = serde_json::from_slice(&puts[0].body).unwrap();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0]["@id"], repository_url(&server));
    assert_eq!(body[0]["http://purl.org/dc/terms/title"][0]["@value"], "Test node");
    assert_eq!(common::header(&puts[0], "authorization"), Some("Bearer islandora"));
}

#[tokio::test]
async fn create_rejected_by_repository_passes_status_through() {
    let server = MockServer::start().await;
    mount_source(&server, T0).await;
    Mock::given(method("PUT"))
        .and(path(NODE_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let (source, _) = source_urls(&server);
    let err = synchronizer(&server)
        .create(&source, &repository_url(&server), None)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::RepositoryWriteRejected { status: 403, .. }));
    assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(err.response_body(), "forbidden");
}

#[tokio::test]
async fn source_failure_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/node/1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let (source, _) = source_urls(&server);
    let err = synchronizer(&server)
        .create(&source, &repository_url(&server), None)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::SourceFetchFailed { status: 500, .. }));
    assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn unmatched_subject_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/node/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(source_document("http://elsewhere.test/node/9", T0)),
        )
        .mount(&server)
        .await;

    let (source, _) = source_urls(&server);
    let err = synchronizer(&server)
        .create(&source, &repository_url(&server), None)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::NoMatchingSubject(_)));
}

// ── update ──────────────────────────────────────────────────────

#[tokio::test]
async fn update_with_equal_timestamps_is_not_newer() {
    let server = MockServer::start().await;
    mount_source(&server, T0).await;
    mount_repository_copy(&server, T0, Some("\"abc\"")).await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let (source, _) = source_urls(&server);
    let err = synchronizer(&server)
        .save(&source, &repository_url(&server), None)
        .await
        .unwrap_err();

    assert!(err.is_conflict());
    assert_eq!(err.status_code(), StatusCode::PRECONDITION_FAILED);
}

#[tokio::test]
async fn update_with_newer_source_sends_state_token() {
    let server = MockServer::start().await;
    mount_source(&server, T0_PLUS_1).await;
    mount_repository_copy(&server, T0, Some("W/\"abc\"")).await;
    Mock::given(method("PUT"))
        .and(path(NODE_PATH))
        .and(header("x-if-state-match", "\"abc\""))
        .and(header("prefer", "handling=lenient"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (source, _) = source_urls(&server);
    let status = synchronizer(&server)
        .save(&source, &repository_url(&server), None)
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let gets: Vec<_> = requests_with_method(&server, "GET")
        .await
        .into_iter()
        .filter(|req| req.url.path() == NODE_PATH)
        .collect();
    assert_eq!(common::header(&gets[0], "accept"), Some("application/ld+json"));
    assert!(common::header(&gets[0], "prefer").is_some_and(|p| p.contains("ServerManaged")));
}

#[tokio::test]
async fn update_without_state_token_is_unconditional() {
    let server = MockServer::start().await;
    mount_source(&server, T0_PLUS_1).await;
    mount_repository_copy(&server, T0, None).await;
    Mock::given(method("PUT"))
        .and(path(NODE_PATH))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (source, _) = source_urls(&server);
    synchronizer(&server)
        .update(&source, &repository_url(&server), None)
        .await
        .unwrap();

    let puts = requests_with_method(&server, "PUT").await;
    assert!(common::header(&puts[0], "x-if-state-match").is_none());
}

#[tokio::test]
async fn repository_copy_without_timestamp_counts_as_oldest() {
    let server = MockServer::start().await;
    mount_source(&server, T0).await;
    Mock::given(method("GET"))
        .and(path(NODE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(NODE_PATH))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (source, _) = source_urls(&server);
    let status = synchronizer(&server)
        .update(&source, &repository_url(&server), None)
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn stale_token_rejection_is_passed_through() {
    let server = MockServer::start().await;
    mount_source(&server, T0_PLUS_1).await;
    mount_repository_copy(&server, T0, Some("\"abc\"")).await;
    Mock::given(method("PUT"))
        .and(path(NODE_PATH))
        .respond_with(ResponseTemplate::new(412).set_body_string("state token mismatch"))
        .mount(&server)
        .await;

    let (source, _) = source_urls(&server);
    let err = synchronizer(&server)
        .update(&source, &repository_url(&server), None)
        .await
        .unwrap_err();

    assert!(!err.is_conflict());
    assert_eq!(err.status_code(), StatusCode::PRECONDITION_FAILED);
    assert_eq!(err.response_body(), "state token mismatch");
}

#[tokio::test]
async fn repository_read_failure_aborts_update() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(NODE_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let (source, _) = source_urls(&server);
    let err = synchronizer(&server)
        .update(&source, &repository_url(&server), None)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::RepositoryReadFailed { method: "GET", status: 401, .. }));
    assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn fedora5_update_headers() {
    let server = MockServer::start().await;
    mount_source(&server, T0_PLUS_1).await;
    mount_repository_copy(&server, T0, None).await;
    Mock::given(method("PUT"))
        .and(path(NODE_PATH))
        .and(header("prefer", "handling=lenient;received=minimal"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let config = fedora5_config(&server);
    let nodes = NodeSynchronizer::new(client(&config), config);
    let (source, _) = source_urls(&server);
    nodes.update(&source, &repository_url(&server), None).await.unwrap();

    let gets: Vec<_> = requests_with_method(&server, "GET")
        .await
        .into_iter()
        .filter(|req| req.url.path() == NODE_PATH)
        .collect();
    assert!(common::header(&gets[0], "prefer").is_none());
}

// ── delete ──────────────────────────────────────────────────────

#[tokio::test]
async fn delete_treats_gone_resources_as_success() {
    for status in [204u16, 404, 410] {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(NODE_PATH))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(&server)
            .await;

        let result = synchronizer(&server).delete(&repository_url(&server), None).await;
        assert_eq!(result.unwrap().as_u16(), status);
    }
}

#[tokio::test]
async fn delete_failure_is_passed_through() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(NODE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = synchronizer(&server)
        .delete(&repository_url(&server), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SyncError::RepositoryWriteRejected { method: "DELETE", status: 500, .. }
    ));
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn unreachable_repository_is_upstream_unavailable() {
    let server = MockServer::start().await;
    let nodes = synchronizer(&server);

    let err = nodes
        .delete("http://127.0.0.1:1/95/41/c0/c1/9541c0c1", None)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::UpstreamUnavailable { .. }));
    assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn unreachable_repository_fails_existence_check() {
    let server = MockServer::start().await;
    mount_source(&server, T0).await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let (source, _) = source_urls(&server);
    let err = synchronizer(&server)
        .save(&source, "http://127.0.0.1:1/95/41/c0/c1/9541c0c1", None)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::UpstreamUnavailable { .. }));
    assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    assert!(requests_with_method(&server, "GET").await.is_empty());
}
