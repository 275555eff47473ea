//! Resolution of derivative (media) resources.
//!
//! A media record's JSON description links to its linked-data form
//! (`alternate`) and to the file it describes (`describes`). The file's
//! repository binary in turn links to its own description
//! (`describedby`), which is the resource that gets indexed.

use crate::client::RepositoryClient;
use crate::error::{SyncError, SyncResult};
use fcsync_types::{pairtree, MEDIA_TYPE_JSONLD};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Path fragment marking files stored directly in the repository's filesystem.
pub const EXTERNAL_FILESYSTEM_FRAGMENT: &str = "_flysystem/fedora/";

/// URLs resolved for one media-indexing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMediaUrls {
    /// The source file the media record describes.
    pub source_describes_url: String,
    /// The repository description resource of that file.
    pub repository_description_url: String,
    /// The media record's linked-data representation.
    pub source_alternate_jsonld_url: String,
}

#[derive(Debug, Deserialize)]
struct FileReference {
    target_uuid: String,
}

/// Walks the link chain from a media record to its repository description.
#[derive(Debug, Clone)]
pub struct MediaResolver {
    client: RepositoryClient,
}

impl MediaResolver {
    pub fn new(client: RepositoryClient) -> Self {
        Self { client }
    }

    pub async fn resolve(
        &self,
        source_field: &str,
        json_url: &str,
        repository_base_url: &str,
        credential: Option<&str>,
    ) -> SyncResult<ResolvedMediaUrls> {
        let response = self
            .client
            .get(json_url, credential, HeaderMap::new())
            .await?;
        if response.status != StatusCode::OK {
            return Err(SyncError::SourceFetchFailed {
                url: json_url.to_string(),
                status: response.status.as_u16(),
            });
        }

        let alternate = response
            .link("alternate", Some(MEDIA_TYPE_JSONLD))
            .ok_or_else(|| SyncError::MissingAlternateLink(json_url.to_string()))?;
        let describes = response
            .link("describes", None)
            .ok_or_else(|| SyncError::MissingDescribesLink(json_url.to_string()))?;

        let media: Map<String, Value> = serde_json::from_slice(&response.body).map_err(|e| {
            SyncError::MissingFileReference(format!(
                "media JSON from {json_url} is not an object: {e}"
            ))
        })?;
        let file_id = file_reference(&media, source_field, json_url)?;

        let file_path = match describes.split_once(EXTERNAL_FILESYSTEM_FRAGMENT) {
            Some((_, path)) => path.to_string(),
            None => pairtree::to_path(&file_id)?,
        };
        let file_url = format!("{}/{}", repository_base_url.trim_end_matches('/'), file_path);

        debug!(%file_url, "HEAD repository file");
        let file = self
            .client
            .head_no_redirect(&file_url, credential, HeaderMap::new())
            .await?;
        if file.status != StatusCode::OK && file.status != StatusCode::TEMPORARY_REDIRECT {
            return Err(SyncError::RepositoryReadFailed {
                method: "HEAD",
                url: file_url,
                status: file.status.as_u16(),
                body: String::new(),
            });
        }

        let description = file
            .link("describedby", None)
            .ok_or_else(|| SyncError::MissingDescribedByLink(file_url.clone()))?;

        Ok(ResolvedMediaUrls {
            source_describes_url: describes,
            repository_description_url: description,
            source_alternate_jsonld_url: alternate,
        })
    }
}

/// First `target_uuid` of the source field.
fn file_reference(
    media: &Map<String, Value>,
    source_field: &str,
    json_url: &str,
) -> SyncResult<String> {
    let field = media.get(source_field).ok_or_else(|| {
        SyncError::MissingFileReference(format!(
            "source field {source_field} not found in media JSON from {json_url}"
        ))
    })?;

    let entries: Vec<FileReference> = serde_json::from_value(field.clone()).map_err(|e| {
        SyncError::MissingFileReference(format!("cannot parse source field {source_field}: {e}"))
    })?;

    entries
        .into_iter()
        .next()
        .map(|entry| entry.target_uuid)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            SyncError::MissingFileReference(format!(
                "cannot extract target_uuid from source field {source_field}"
            ))
        })
}
