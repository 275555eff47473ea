//! Version snapshots.

use crate::client::RepositoryClient;
use crate::error::{SyncError, SyncResult};
use crate::headers;
use crate::media::MediaResolver;
use chrono::Utc;
use fcsync_types::pairtree;
use reqwest::StatusCode;
use tracing::info;

const VERSIONS_PATH: &str = "fcr:versions";

/// Creates immutable snapshots of repository resources.
#[derive(Debug, Clone)]
pub struct VersionManager {
    client: RepositoryClient,
    media: MediaResolver,
}

impl VersionManager {
    pub fn new(client: RepositoryClient, media: MediaResolver) -> Self {
        Self { client, media }
    }

    /// Snapshots the resource stored under `identifier`.
    pub async fn create_version(
        &self,
        identifier: &str,
        repository_base_url: &str,
        credential: Option<&str>,
    ) -> SyncResult<StatusCode> {
        let url = pairtree::resource_url(repository_base_url, identifier)?;
        self.post_version(&url, credential).await
    }

    /// Snapshots the repository description of a media record's file.
    pub async fn create_media_version(
        &self,
        source_field: &str,
        json_url: &str,
        repository_base_url: &str,
        credential: Option<&str>,
    ) -> SyncResult<StatusCode> {
        let urls = self
            .media
            .resolve(source_field, json_url, repository_base_url, credential)
            .await?;
        self.post_version(&urls.repository_description_url, credential)
            .await
    }

    /// POSTs to `{resource_url}/fcr:versions`. Only `201 Created` succeeds.
    pub async fn post_version(
        &self,
        resource_url: &str,
        credential: Option<&str>,
    ) -> SyncResult<StatusCode> {
        let url = format!("{}/{VERSIONS_PATH}", resource_url.trim_end_matches('/'));
        let response = self
            .client
            .post_version(&url, credential, headers::memento_headers(Utc::now())?)
            .await?;

        if response.status != StatusCode::CREATED {
            return Err(SyncError::VersioningFailed {
                url,
                status: response.status.as_u16(),
                body: response.body_text(),
            });
        }

        info!(%url, "created version in repository");
        Ok(response.status)
    }
}
