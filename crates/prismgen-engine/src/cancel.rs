//! Cooperative cancellation for generation sessions.
//!
//! A client disconnect or explicit cancel must stop further stage
//! execution and release any in-progress provider call without corrupting
//! the cache: the orchestrator selects on the token around every
//! suspending call and never writes a cache entry after cancellation.

use tokio::sync::watch;

/// Caller-held handle that cancels the session.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    /// Cancel the associated session. Idempotent.
    pub fn cancel(&self) {
        let _ = self.sender.send(true);
    }
}

/// Session-held token observed between and inside stages.
#[derive(Debug, Clone)]
pub struct CancelToken {
    receiver: watch::Receiver<bool>,
}

impl CancelToken {
    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolve when cancellation is requested. If the handle was dropped
    /// without cancelling, pends forever (the session just runs to its own
    /// completion or timeout).
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        loop {
            if *receiver.borrow() {
                return;
            }
            if receiver.changed().await.is_err() {
                // Handle dropped without cancelling.
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Create a connected handle/token pair.
#[must_use]
pub fn pair() -> (CancelHandle, CancelToken) {
    let (sender, receiver) = watch::channel(false);
    (CancelHandle { sender }, CancelToken { receiver })
}
