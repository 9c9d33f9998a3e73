//! Progress events and the ordered stream publisher.
//!
//! The orchestrators emit events through an [`EventPublisher`]; clients
//! consume the matching [`EventStream`]. The publisher's contract: emission
//! order is preserved losslessly, and exactly one terminal event
//! (`complete`, `cache_hit`, or `error`) is delivered per session, always
//! last. Framing and transport are the caller's concern; a JSON-lines
//! helper is provided for the CLI.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, warn};

use prismgen_utils::error::ErrorCode;
use prismgen_utils::types::Stage;

/// Reference to a produced artifact, as carried on terminal events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Download location of the artifact.
    pub path: Utf8PathBuf,
    /// BLAKE3 hash of the artifact content.
    pub content_hash: String,
    /// Document/deck title.
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slides: Option<u32>,
}

/// One element of a session's event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Stage progress. Percent is monotonically non-decreasing within a
    /// session.
    Progress {
        stage: Stage,
        percent: u8,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Terminal: generation completed and the artifact was cached.
    Complete { artifact: ArtifactRef },
    /// Terminal: an identical previous request already produced this
    /// artifact; no stages were re-run.
    CacheHit { artifact: ArtifactRef },
    /// Terminal: the session failed.
    Error { message: String, code: ErrorCode },
}

impl Event {
    /// Whether this event terminates the stream.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Complete { .. } | Self::CacheHit { .. } | Self::Error { .. }
        )
    }

    /// Serialize as one JSON line (no trailing newline).
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Producer half of a session's event stream.
///
/// Not `Clone`: a session has exactly one publisher, which is what makes
/// the exactly-once terminal guarantee enforceable here rather than in
/// every caller.
pub struct EventPublisher {
    sender: mpsc::Sender<Event>,
    terminal_sent: bool,
    last_percent: u8,
}

/// Consumer half of a session's event stream.
pub struct EventStream {
    receiver: mpsc::Receiver<Event>,
}

/// Create a connected publisher/stream pair.
#[must_use]
pub fn channel(capacity: usize) -> (EventPublisher, EventStream) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (
        EventPublisher {
            sender,
            terminal_sent: false,
            last_percent: 0,
        },
        EventStream { receiver },
    )
}

impl EventPublisher {
    /// Publish an event, preserving order and awaiting on backpressure.
    ///
    /// Violations of the stream invariants are not sent: anything after a
    /// terminal event is dropped with an error log, and a progress percent
    /// lower than one already published is raised to the high-water mark
    /// rather than emitted out of order.
    ///
    /// Returns `false` when the event was suppressed or the consumer is
    /// gone (client disconnect); the caller may use that as a cancellation
    /// signal.
    pub async fn publish(&mut self, event: Event) -> bool {
        if self.terminal_sent {
            error!(?event, "Dropping event published after terminal event");
            return false;
        }

        let event = match event {
            Event::Progress {
                stage,
                percent,
                message,
            } => {
                let percent = percent.clamp(self.last_percent, 100);
                self.last_percent = percent;
                Event::Progress {
                    stage,
                    percent,
                    message,
                }
            }
            terminal => {
                self.terminal_sent = true;
                terminal
            }
        };

        match self.sender.send(event).await {
            Ok(()) => true,
            Err(e) => {
                warn!(event = ?e.0, "Event consumer disconnected");
                false
            }
        }
    }

    /// Whether the terminal event has been published.
    #[must_use]
    pub const fn is_terminated(&self) -> bool {
        self.terminal_sent
    }
}

impl EventStream {
    /// Receive the next event; `None` once the stream is closed.
    pub async fn next(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Drain all remaining events until the stream closes.
    pub async fn collect(mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some(event) = self.next().await {
            events.push(event);
        }
        events
    }
}
