//! Registration of by-reference (redirect) binaries.

use crate::client::RepositoryClient;
use crate::error::{SyncError, SyncResult};
use crate::headers;
use crate::node::accept_write;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::{debug, info};

/// Fallback media type when the external store does not report one.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone)]
pub struct ExternalContentHandler {
    client: RepositoryClient,
}

impl ExternalContentHandler {
    pub fn new(client: RepositoryClient) -> Self {
        Self { client }
    }

    /// PUTs an empty resource at `repository_url` whose `Link` header points
    /// at `external_url`.
    pub async fn save(
        &self,
        external_url: &str,
        repository_url: &str,
        credential: Option<&str>,
    ) -> SyncResult<StatusCode> {
        let mime_type = self.sniff_mime_type(external_url, credential).await?;

        let response = self
            .client
            .put(
                repository_url,
                credential,
                headers::external_content_headers(external_url, &mime_type)?,
                None,
            )
            .await?;
        let status = accept_write("PUT", repository_url, &response)?;

        info!(repository_url, external_url, %mime_type, "saved external content to repository");
        Ok(status)
    }

    /// HEADs the external URL for its media type, parameters stripped.
    ///
    /// A 4xx with the caller's credential is retried once anonymously.
    pub async fn sniff_mime_type(
        &self,
        external_url: &str,
        credential: Option<&str>,
    ) -> SyncResult<String> {
        let mut response = self
            .client
            .head(external_url, credential, HeaderMap::new())
            .await?;

        let has_credential = credential.is_some_and(|c| !c.is_empty());
        if response.status.is_client_error() && has_credential {
            debug!(
                external_url,
                status = response.status.as_u16(),
                "authenticated HEAD failed, retrying without credential"
            );
            response = self
                .client
                .head(external_url, None, HeaderMap::new())
                .await?;
        }

        if response.status != StatusCode::OK {
            return Err(SyncError::SourceFetchFailed {
                url: external_url.to_string(),
                status: response.status.as_u16(),
            });
        }

        let mime_type = response
            .headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(headers::strip_media_type_params)
            .filter(|essence| !essence.is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE);
        Ok(mime_type.to_string())
    }
}
