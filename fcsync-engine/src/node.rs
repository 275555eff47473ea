//! Create/update/delete protocol for a single described resource.
//!
//! The existence check picks a branch; the branch performs at most one
//! mutating call, as its last step. Conflict detection is left to the
//! repository's state token: a stale token makes the conditional PUT fail.

use crate::client::{RawResponse, RepositoryClient};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::graph;
use crate::headers::{self, ConcurrencyToken};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

const FORMAT_JSONLD_SUFFIX: &str = "?_format=jsonld";

/// Outcome of the existence check on a repository resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    /// The repository has no such resource; create it.
    Absent,
    /// Anything but 404; update in place.
    Present,
}

impl ResourceState {
    /// Decides the branch from the status of a HEAD on the resource.
    pub fn from_head_status(status: StatusCode) -> Self {
        if status == StatusCode::NOT_FOUND {
            Self::Absent
        } else {
            Self::Present
        }
    }
}

/// Runs the create/update/delete protocol against the repository.
#[derive(Debug, Clone)]
pub struct NodeSynchronizer {
    client: RepositoryClient,
    config: Arc<SyncConfig>,
}

impl NodeSynchronizer {
    pub fn new(client: RepositoryClient, config: Arc<SyncConfig>) -> Self {
        Self { client, config }
    }

    /// Creates or updates `repository_url` from the linked-data document at
    /// `source_url`. Returns the repository's write status.
    pub async fn save(
        &self,
        source_url: &str,
        repository_url: &str,
        credential: Option<&str>,
    ) -> SyncResult<StatusCode> {
        match self.check_existence(repository_url, credential).await? {
            ResourceState::Absent => {
                debug!(repository_url, "resource not found, creating");
                self.create(source_url, repository_url, credential).await
            }
            ResourceState::Present => {
                debug!(repository_url, "resource exists, updating");
                self.update(source_url, repository_url, credential).await
            }
        }
    }

    /// HEADs the resource to decide between create and update.
    pub async fn check_existence(
        &self,
        repository_url: &str,
        credential: Option<&str>,
    ) -> SyncResult<ResourceState> {
        let response = self
            .client
            .head(repository_url, credential, HeaderMap::new())
            .await?;
        Ok(ResourceState::from_head_status(response.status))
    }

    /// Writes the filtered source document as a new resource.
    pub async fn create(
        &self,
        source_url: &str,
        repository_url: &str,
        credential: Option<&str>,
    ) -> SyncResult<StatusCode> {
        let document = self
            .fetch_source(source_url, repository_url, credential)
            .await?;
        let body = serde_json::to_vec(&document)?;

        let response = self
            .client
            .put(repository_url, credential, headers::create_headers(), Some(body))
            .await?;
        let status = accept_write("PUT", repository_url, &response)?;

        info!(repository_url, status = status.as_u16(), "created node in repository");
        Ok(status)
    }

    /// Overwrites the resource if the source copy is newer.
    ///
    /// Fails with [`SyncError::NotNewer`] when the source's modified date is
    /// not after the repository's.
    pub async fn update(
        &self,
        source_url: &str,
        repository_url: &str,
        credential: Option<&str>,
    ) -> SyncResult<StatusCode> {
        let current = self
            .client
            .get(
                repository_url,
                credential,
                headers::read_headers(self.config.generation),
            )
            .await?;
        if current.status != StatusCode::OK {
            return Err(SyncError::RepositoryReadFailed {
                method: "GET",
                url: repository_url.to_string(),
                status: current.status.as_u16(),
                body: current.body_text(),
            });
        }

        let token = ConcurrencyToken::from_headers(&current.headers)?;
        debug!(
            repository_url,
            token = ?token.as_ref().map(ConcurrencyToken::as_str),
            "state token"
        );

        let repository_modified = self.repository_modified(&current);

        let document = self
            .fetch_source(source_url, repository_url, credential)
            .await?;
        let source_modified =
            graph::extract_modified_timestamp(&document, &self.config.modified_predicate)?;

        if source_modified <= repository_modified {
            info!(
                repository_url,
                source_url, source_modified, repository_modified, "source is not newer, skipping"
            );
            return Err(SyncError::NotNewer {
                repository_url: repository_url.to_string(),
                source_url: source_url.to_string(),
            });
        }

        let body = serde_json::to_vec(&document)?;
        let response = self
            .client
            .put(
                repository_url,
                credential,
                headers::update_headers(self.config.generation, token.as_ref()),
                Some(body),
            )
            .await?;
        let status = accept_write("PUT", repository_url, &response)?;

        info!(repository_url, status = status.as_u16(), "updated node in repository");
        Ok(status)
    }

    /// Removes the resource. Already gone or tombstoned counts as success.
    pub async fn delete(
        &self,
        repository_url: &str,
        credential: Option<&str>,
    ) -> SyncResult<StatusCode> {
        let response = self
            .client
            .delete(repository_url, credential, HeaderMap::new())
            .await?;
        match response.status {
            StatusCode::NO_CONTENT | StatusCode::NOT_FOUND | StatusCode::GONE => {
                info!(
                    repository_url,
                    status = response.status.as_u16(),
                    "deleted node from repository"
                );
                Ok(response.status)
            }
            _ => Err(rejected("DELETE", repository_url, &response)),
        }
    }

    /// GETs the source document and narrows it to the resource's subject.
    async fn fetch_source(
        &self,
        source_url: &str,
        repository_url: &str,
        credential: Option<&str>,
    ) -> SyncResult<Vec<Value>> {
        let response = self
            .client
            .get(source_url, credential, HeaderMap::new())
            .await?;
        if response.status != StatusCode::OK {
            return Err(SyncError::SourceFetchFailed {
                url: source_url.to_string(),
                status: response.status.as_u16(),
            });
        }

        graph::filter_and_rewrite_bytes(
            &response.body,
            self.subject_url(source_url),
            repository_url,
        )
    }

    /// The repository's modified date, or zero when it has none.
    fn repository_modified(&self, current: &RawResponse) -> i64 {
        let modified = serde_json::from_slice::<Vec<Value>>(&current.body)
            .map_err(SyncError::from)
            .and_then(|doc| {
                graph::extract_modified_timestamp(&doc, &self.config.modified_predicate)
            });
        match modified {
            Ok(ts) => ts,
            Err(e) => {
                debug!(error = %e, "no modified timestamp in repository copy, using 0");
                0
            }
        }
    }

    fn subject_url<'a>(&self, source_url: &'a str) -> &'a str {
        if self.config.strip_format_jsonld {
            source_url
                .strip_suffix(FORMAT_JSONLD_SUFFIX)
                .unwrap_or(source_url)
        } else {
            source_url
        }
    }
}

/// Accepts `201 Created` or `204 No Content`, rejects anything else.
pub(crate) fn accept_write(
    method: &'static str,
    url: &str,
    response: &RawResponse,
) -> SyncResult<StatusCode> {
    match response.status {
        StatusCode::CREATED | StatusCode::NO_CONTENT => Ok(response.status),
        _ => Err(rejected(method, url, response)),
    }
}

fn rejected(method: &'static str, url: &str, response: &RawResponse) -> SyncError {
    SyncError::RepositoryWriteRejected {
        method,
        url: url.to_string(),
        status: response.status.as_u16(),
        body: response.body_text(),
    }
}
