//! Thin HTTP verb wrapper for the repository and the source system.
//!
//! Every call takes an optional credential (sent verbatim as the
//! `Authorization` header when non-empty) and returns the fully read
//! response. Only transport failures are errors here; status handling
//! belongs to the caller.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::link_header;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{redirect, Client, Method, RequestBuilder, StatusCode};
use std::time::Duration;
use tracing::debug;

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Finds a `Link` header entry by relation and optional media type.
    pub fn link(&self, relation: &str, media_type: Option<&str>) -> Option<String> {
        link_header::find_link(&self.headers, relation, media_type)
    }

    /// The body as text, for diagnostics.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// HTTP client for repository and source-system calls.
///
/// Cheap to clone; clones share connection pools.
#[derive(Debug, Clone)]
pub struct RepositoryClient {
    client: Client,
    no_redirect: Client,
}

impl RepositoryClient {
    /// Builds a client whose every request is bounded by the configured timeout.
    pub fn new(config: &SyncConfig) -> SyncResult<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let build = |policy: redirect::Policy| {
            Client::builder()
                .timeout(timeout)
                .redirect(policy)
                .build()
                .map_err(|e| SyncError::ClientBuild(e.to_string()))
        };

        Ok(Self {
            client: build(redirect::Policy::default())?,
            no_redirect: build(redirect::Policy::none())?,
        })
    }

    /// HEAD that follows redirects.
    pub async fn head(
        &self,
        url: &str,
        credential: Option<&str>,
        headers: HeaderMap,
    ) -> SyncResult<RawResponse> {
        self.send(&self.client, Method::HEAD, url, credential, headers, None)
            .await
    }

    /// HEAD that returns 3xx responses as-is instead of following them.
    pub async fn head_no_redirect(
        &self,
        url: &str,
        credential: Option<&str>,
        headers: HeaderMap,
    ) -> SyncResult<RawResponse> {
        self.send(&self.no_redirect, Method::HEAD, url, credential, headers, None)
            .await
    }

    /// GET with the full body read.
    pub async fn get(
        &self,
        url: &str,
        credential: Option<&str>,
        headers: HeaderMap,
    ) -> SyncResult<RawResponse> {
        self.send(&self.client, Method::GET, url, credential, headers, None)
            .await
    }

    /// PUT, optionally with a body.
    pub async fn put(
        &self,
        url: &str,
        credential: Option<&str>,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> SyncResult<RawResponse> {
        self.send(&self.client, Method::PUT, url, credential, headers, body)
            .await
    }

    /// DELETE without a body.
    pub async fn delete(
        &self,
        url: &str,
        credential: Option<&str>,
        headers: HeaderMap,
    ) -> SyncResult<RawResponse> {
        self.send(&self.client, Method::DELETE, url, credential, headers, None)
            .await
    }

    /// POST to a resource's versions endpoint.
    pub async fn post_version(
        &self,
        url: &str,
        credential: Option<&str>,
        headers: HeaderMap,
    ) -> SyncResult<RawResponse> {
        self.send(&self.client, Method::POST, url, credential, headers, None)
            .await
    }

    async fn send(
        &self,
        client: &Client,
        method: Method,
        url: &str,
        credential: Option<&str>,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> SyncResult<RawResponse> {
        debug!(%method, url, "repository request");

        let mut request: RequestBuilder = client.request(method, url).headers(headers);
        if let Some(credential) = credential.filter(|c| !c.is_empty()) {
            let value = HeaderValue::from_str(credential).map_err(|e| SyncError::InvalidHeader {
                name: AUTHORIZATION.to_string(),
                reason: e.to_string(),
            })?;
            request = request.header(AUTHORIZATION, value);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SyncError::unavailable(url, e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| SyncError::unavailable(url, format!("read body failed: {e}")))?;

        Ok(RawResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}
