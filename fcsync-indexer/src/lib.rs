//! Process shell around the fcsync engine: event input and outcome reporting.

use anyhow::{Context, Result};
use fcsync_engine::{EventHandler, HandlerResponse};
use fcsync_types::Event;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Exit code for a handled event that did not succeed.
pub const EXIT_FAILURE: u8 = 1;

/// Exit code when the repository already held an up-to-date copy.
pub const EXIT_NOT_NEWER: u8 = 3;

/// Reads one event message from `path`, or from stdin when `path` is `None`
/// or `-`.
pub async fn read_event(path: Option<&Path>) -> Result<Event> {
    match path.filter(|p| *p != Path::new("-")) {
        Some(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("failed to read event file {}", path.display()))?;
            decode(&bytes)
        }
        None => read_event_from(tokio::io::stdin()).await,
    }
}

/// Reads one event message from any async reader.
pub async fn read_event_from<R: AsyncRead + Unpin>(mut reader: R) -> Result<Event> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .await
        .context("failed to read event message")?;
    decode(&bytes)
}

fn decode(bytes: &[u8]) -> Result<Event> {
    Event::from_json(bytes).context("failed to decode event message")
}

/// Runs one event through `handler`.
pub async fn run<H: EventHandler + ?Sized>(
    handler: &H,
    event: &Event,
    credential: &str,
) -> HandlerResponse {
    handler.handle(event, credential).await
}

/// One-line rendering of a handler response: status, then body.
pub fn render(response: &HandlerResponse) -> String {
    format!(
        "{} {}",
        response.status.as_u16(),
        String::from_utf8_lossy(&response.body)
    )
}

/// Maps a handler response to a process exit code.
pub fn exit_code(response: &HandlerResponse) -> u8 {
    match &response.error {
        None => 0,
        Some(e) if e.is_conflict() => EXIT_NOT_NEWER,
        Some(_) => EXIT_FAILURE,
    }
}
