//! In-flight build registry: at most one concurrent build per fingerprint.
//!
//! The first session to begin a fingerprint becomes the owner and runs the
//! build; concurrent duplicates become followers and await the owner's
//! broadcast outcome instead of starting parallel identical work. The
//! owner's guard tears the registration down on drop, so a cancelled or
//! panicked build wakes followers with a failure rather than hanging them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::{CacheEntry, Fingerprint};

/// How an owned build resolved, as seen by followers.
#[derive(Debug, Clone)]
pub enum BuildOutcome {
    /// Build completed; followers resolve to this cache entry.
    Completed(CacheEntry),
    /// Build failed or was abandoned; message describes why.
    Failed(String),
}

/// Result of [`InflightRegistry::begin`].
pub enum BuildSlot {
    /// Caller owns the build and must resolve the guard.
    Owner(BuildGuard),
    /// An identical build is in flight; await its outcome.
    Follower(broadcast::Receiver<BuildOutcome>),
}

type Registry = Arc<Mutex<HashMap<String, broadcast::Sender<BuildOutcome>>>>;

/// Registry mapping fingerprints to in-flight build handles.
#[derive(Debug, Default, Clone)]
pub struct InflightRegistry {
    inner: Registry,
}

impl InflightRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin (or join) the build for a fingerprint.
    ///
    /// Returns [`BuildSlot::Owner`] when no build is in flight; the caller
    /// must then run the build and call [`BuildGuard::complete`]. Returns
    /// [`BuildSlot::Follower`] when an identical build is already running.
    #[must_use]
    pub fn begin(&self, fingerprint: &Fingerprint) -> BuildSlot {
        let mut map = self.inner.lock().expect("inflight registry lock poisoned");

        if let Some(sender) = map.get(fingerprint.as_str()) {
            debug!(fingerprint = %fingerprint, "Joining in-flight build as follower");
            return BuildSlot::Follower(sender.subscribe());
        }

        let (sender, _) = broadcast::channel(4);
        map.insert(fingerprint.as_str().to_string(), sender.clone());
        debug!(fingerprint = %fingerprint, "Registered as build owner");

        BuildSlot::Owner(BuildGuard {
            registry: Arc::clone(&self.inner),
            fingerprint: fingerprint.clone(),
            sender,
            resolved: false,
        })
    }

    /// Number of builds currently in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().expect("inflight registry lock poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owner's handle on an in-flight build registration.
///
/// Must be resolved with [`complete`](Self::complete); dropping an
/// unresolved guard (cancellation, panic unwind) broadcasts a failure so
/// followers never hang.
pub struct BuildGuard {
    registry: Registry,
    fingerprint: Fingerprint,
    sender: broadcast::Sender<BuildOutcome>,
    resolved: bool,
}

impl BuildGuard {
    /// Resolve the build, waking all followers, and deregister.
    pub fn complete(mut self, outcome: BuildOutcome) {
        self.resolve(outcome);
    }

    fn resolve(&mut self, outcome: BuildOutcome) {
        if self.resolved {
            return;
        }
        self.resolved = true;

        if let Ok(mut map) = self.registry.lock() {
            map.remove(self.fingerprint.as_str());
        }
        // Send fails only when no follower is subscribed, which is fine.
        let _ = self.sender.send(outcome);
    }
}

impl Drop for BuildGuard {
    fn drop(&mut self) {
        if !self.resolved {
            warn!(fingerprint = %self.fingerprint, "Build abandoned before resolution");
            self.resolve(BuildOutcome::Failed("build abandoned".to_string()));
        }
    }
}
