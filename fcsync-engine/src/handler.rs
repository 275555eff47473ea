//! Event dispatch.
//!
//! The handler classifies an event, runs the matching protocol and folds
//! the outcome into the `(status, body, content type, error)` shape the
//! transport layer replies with.

use crate::client::RepositoryClient;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::external::ExternalContentHandler;
use crate::media::MediaResolver;
use crate::node::NodeSynchronizer;
use crate::version::VersionManager;
use async_trait::async_trait;
use fcsync_types::{classify, pairtree, Event, EventAction, MEDIA_TYPE_JSON, MEDIA_TYPE_JSONLD};
use reqwest::StatusCode;
use std::sync::Arc;
use tracing::{info, warn};

pub const TEXT_PLAIN: &str = "text/plain";

/// What the transport layer sends back for one event.
#[derive(Debug)]
pub struct HandlerResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
    pub content_type: String,
    pub error: Option<SyncError>,
}

impl HandlerResponse {
    pub fn ok(body: &str) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.as_bytes().to_vec(),
            content_type: TEXT_PLAIN.to_string(),
            error: None,
        }
    }

    pub fn from_error(error: SyncError) -> Self {
        Self {
            status: error.status_code(),
            body: error.response_body().into_bytes(),
            content_type: TEXT_PLAIN.to_string(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Something that can consume a decoded event.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handles one event. `credential` is the transport's bearer
    /// credential and may be empty.
    async fn handle(&self, event: &Event, credential: &str) -> HandlerResponse;
}

/// Entry point of the repository sync core.
#[derive(Debug, Clone)]
pub struct SynchronizationHandler {
    config: Arc<SyncConfig>,
    nodes: NodeSynchronizer,
    media: MediaResolver,
    external: ExternalContentHandler,
    versions: VersionManager,
}

impl SynchronizationHandler {
    /// Builds the handler and all its components from one configuration.
    pub fn new(config: SyncConfig) -> SyncResult<Self> {
        let config = Arc::new(config);
        let client = RepositoryClient::new(&config)?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: Arc<SyncConfig>, client: RepositoryClient) -> Self {
        let media = MediaResolver::new(client.clone());
        Self {
            nodes: NodeSynchronizer::new(client.clone(), config.clone()),
            external: ExternalContentHandler::new(client.clone()),
            versions: VersionManager::new(client, media.clone()),
            media,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    async fn dispatch(&self, event: &Event, credential: Option<&str>) -> SyncResult<&'static str> {
        let base_url = event.target_or(&self.config.repository_url);
        let identifier = event.object_id();
        let action = classify(&event.event_type, &event.summary, event);

        info!(
            event_type = %event.event_type,
            summary = %event.summary,
            identifier,
            target = base_url,
            %action,
            "processing event"
        );

        match action {
            EventAction::Delete => {
                let url = pairtree::resource_url(base_url, identifier)?;
                self.nodes.delete(&url, credential).await?;
                Ok("deleted")
            }

            EventAction::NodeIndex => {
                let source_url = event
                    .find_url_by_media_type(MEDIA_TYPE_JSONLD)
                    .ok_or_else(|| missing("no JSON-LD URL found in event"))?;
                let url = pairtree::resource_url(base_url, identifier)?;
                self.nodes.save(source_url, &url, credential).await?;

                if event.object.is_new_version {
                    if let Err(e) =
                        self.versions.create_version(identifier, base_url, credential).await
                    {
                        warn!(
                            error = %e,
                            status = e.status_code().as_u16(),
                            "failed to create version"
                        );
                    }
                }
                Ok("indexed")
            }

            EventAction::MediaIndex => {
                let source_field = event
                    .source_field()
                    .ok_or_else(|| missing("no source_field in event attachment"))?;
                let json_url = event
                    .find_url_by_media_type(MEDIA_TYPE_JSON)
                    .ok_or_else(|| missing("no JSON URL found in event"))?;

                let urls = self
                    .media
                    .resolve(source_field, json_url, base_url, credential)
                    .await?;
                self.nodes
                    .save(
                        &urls.source_alternate_jsonld_url,
                        &urls.repository_description_url,
                        credential,
                    )
                    .await?;

                if event.object.is_new_version {
                    if let Err(e) = self
                        .versions
                        .create_media_version(source_field, json_url, base_url, credential)
                        .await
                    {
                        warn!(
                            error = %e,
                            status = e.status_code().as_u16(),
                            "failed to create media version"
                        );
                    }
                }
                Ok("media indexed")
            }

            EventAction::ExternalIndex => {
                let external_url = event
                    .find_url_by_rel("canonical")
                    .ok_or_else(|| missing("no canonical URL found in event"))?;
                let url = pairtree::resource_url(base_url, identifier)?;
                self.external.save(external_url, &url, credential).await?;
                Ok("external indexed")
            }

            EventAction::Unknown => {
                warn!(
                    event_type = %event.event_type,
                    summary = %event.summary,
                    "unknown action for event"
                );
                Ok("no action")
            }
        }
    }
}

#[async_trait]
impl EventHandler for SynchronizationHandler {
    async fn handle(&self, event: &Event, credential: &str) -> HandlerResponse {
        let credential = Some(event.credential_or(credential)).filter(|c| !c.is_empty());

        match self.dispatch(event, credential).await {
            Ok(body) => HandlerResponse::ok(body),
            Err(e) if e.is_conflict() => {
                info!(error = %e, "repository already up to date");
                HandlerResponse::from_error(e)
            }
            Err(e) => {
                warn!(error = %e, status = e.status_code().as_u16(), "event handling failed");
                HandlerResponse::from_error(e)
            }
        }
    }
}

fn missing(what: &str) -> SyncError {
    SyncError::MissingEventField(what.to_string())
}
