//! Repository synchronization engine for fcsync.
//!
//! Keeps a linked-data repository consistent with a content-management
//! source in response to change notifications.
//!
//! # Architecture
//!
//! - **RepositoryClient**: HTTP verb wrapper plus `Link` header lookup
//! - **Graph**: subject filtering, `@id` rewriting, timestamp extraction
//! - **NodeSynchronizer**: create/update/delete with conflict avoidance
//! - **MediaResolver**: media record -> repository description URL chain
//! - **ExternalContentHandler**: by-reference binary registration
//! - **VersionManager**: `fcr:versions` snapshots
//! - **SynchronizationHandler**: classification and dispatch
//!
//! Each event is handled by a strictly sequential chain of requests. No
//! state is shared between events beyond the HTTP client, and writes only
//! happen as the last step of a chain, so a failed event leaves the
//! repository untouched and can be redelivered.
//!
//! # Example
//!
//! ```
//! use fcsync_engine::{SyncConfig, SynchronizationHandler};
//!
//! let config = SyncConfig {
//!     repository_url: "http://localhost:8080/fcrepo/rest".to_string(),
//!     ..Default::default()
//! };
//!
//! let handler = SynchronizationHandler::new(config).unwrap();
//! assert!(handler.config().is_fedora6());
//! ```

pub mod client;
mod config;
mod error;
pub mod external;
pub mod graph;
mod handler;
pub mod headers;
pub mod link_header;
pub mod media;
pub mod node;
pub mod version;

pub use client::{RawResponse, RepositoryClient};
pub use config::{RepositoryGeneration, SyncConfig};
pub use error::{SyncError, SyncResult};
pub use external::ExternalContentHandler;
pub use handler::{EventHandler, HandlerResponse, SynchronizationHandler, TEXT_PLAIN};
pub use headers::ConcurrencyToken;
pub use media::{MediaResolver, ResolvedMediaUrls};
pub use node::{NodeSynchronizer, ResourceState};
pub use version::VersionManager;
