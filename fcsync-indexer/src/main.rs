//! fcsync indexer
//!
//! Applies one change-event message to the repository and reports the
//! outcome.
//!
//! Usage:
//!   fcsync-indexer event.json --token "Bearer ..."
//!   cat event.json | fcsync-indexer
//!
//! Configuration comes from the `FCREPO_INDEXER_*` environment variables.

use anyhow::{Context, Result};
use clap::Parser;
use fcsync_engine::{SyncConfig, SynchronizationHandler};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const LOG_LEVEL_ENV: &str = "FCSYNC_LOG_LEVEL";

#[derive(Parser, Debug)]
#[command(name = "fcsync-indexer")]
#[command(about = "Synchronizes a linked-data repository from change events")]
struct Args {
    /// Event message file; reads stdin when omitted or `-`
    event: Option<PathBuf>,

    /// Authorization header value forwarded to every outbound request
    #[arg(short, long, default_value = "")]
    token: String,

    /// Repository base URL, overriding FCREPO_INDEXER_FEDORA_URL
    #[arg(long)]
    repository_url: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(LOG_LEVEL_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let mut config = SyncConfig::from_env();
    if let Some(url) = args.repository_url {
        config.repository_url = url;
    }
    debug!(?config, "loaded configuration");

    let handler = SynchronizationHandler::new(config).context("failed to build handler")?;
    let event = fcsync_indexer::read_event(args.event.as_deref()).await?;
    info!(id = event.object_id(), "handling event");

    let response = fcsync_indexer::run(&handler, &event, &args.token).await;
    println!("{}", fcsync_indexer::render(&response));

    Ok(ExitCode::from(fcsync_indexer::exit_code(&response)))
}
