//! Content-addressed caching for generation requests.
//!
//! Three pieces:
//! - [`Fingerprint`]: deterministic hash identifying a logically identical
//!   request (canonicalized sources + every content-affecting option).
//! - [`CacheStore`]: fingerprint → cache entry, JSON files with lazy TTL
//!   expiry and first-writer-wins stores.
//! - [`InflightRegistry`]: at most one concurrent build per fingerprint;
//!   duplicate requests follow the owner's outcome instead of rebuilding.

mod fingerprint;
mod inflight;
mod store;

pub use fingerprint::{CanonicalRequest, CanonicalSource, Fingerprint};
pub use inflight::{BuildGuard, BuildOutcome, BuildSlot, InflightRegistry};
pub use store::{CacheEntry, CacheStore};
