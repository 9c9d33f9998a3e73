//! Fingerprint-keyed cache store.
//!
//! One JSON file per fingerprint under the cache directory, written
//! atomically. Entries are never mutated: the first writer for a
//! fingerprint wins, and later identical builds are no-ops unless an
//! explicit bypass requests overwrite. Expiry is lazy: expired or corrupt
//! entries are removed at lookup time and reported as misses.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::Fingerprint;
use prismgen_utils::atomic_write::write_file_atomic;
use prismgen_utils::error::CacheError;
use prismgen_utils::types::TokenUsage;

/// A cached generation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Fingerprint this entry was stored under.
    pub fingerprint: String,
    /// Location of the rendered artifact.
    pub artifact_path: Utf8PathBuf,
    /// BLAKE3 hash of the artifact content.
    pub content_hash: String,
    /// Artifact size in bytes.
    pub size_bytes: u64,
    /// Document/deck title.
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slides: Option<u32>,
    /// Token spend of the build that produced this entry.
    pub usage: TokenUsage,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
}

/// Hit/miss statistics, tracked for observability.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub expirations: usize,
    pub writes: usize,
}

/// Fingerprint → entry store backed by JSON files.
#[derive(Debug)]
pub struct CacheStore {
    cache_dir: Utf8PathBuf,
    ttl: Duration,
    stats: std::sync::Mutex<CacheStats>,
}

impl CacheStore {
    /// Open (creating if needed) a store at `cache_dir` with the given TTL.
    ///
    /// # Errors
    /// Returns [`CacheError::Io`] if the directory cannot be created.
    pub fn open(cache_dir: impl Into<Utf8PathBuf>, ttl: Duration) -> Result<Self, CacheError> {
        let cache_dir = cache_dir.into();
        prismgen_utils::paths::ensure_dir_all(&cache_dir).map_err(|e| CacheError::Io {
            path: cache_dir.to_string(),
            source: e,
        })?;

        Ok(Self {
            cache_dir,
            ttl,
            stats: std::sync::Mutex::new(CacheStats::default()),
        })
    }

    /// Current hit/miss statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        *self.stats.lock().expect("cache stats lock poisoned")
    }

    fn entry_path(&self, fingerprint: &Fingerprint) -> Utf8PathBuf {
        self.cache_dir.join(format!("{fingerprint}.json"))
    }

    fn bump<F: FnOnce(&mut CacheStats)>(&self, f: F) {
        if let Ok(mut stats) = self.stats.lock() {
            f(&mut stats);
        }
    }

    /// Look up the entry for a fingerprint.
    ///
    /// Wait-free with respect to writers: readers only ever see the
    /// previous complete file or the new complete file. Corrupt and
    /// expired entries are removed and reported as misses.
    ///
    /// # Errors
    /// Returns [`CacheError::Io`] only for I/O failures other than
    /// not-found; callers are expected to degrade to a no-cache path.
    pub fn lookup(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.entry_path(fingerprint);

        let text = match std::fs::read_to_string(path.as_std_path()) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.bump(|s| s.misses += 1);
                return Ok(None);
            }
            Err(e) => {
                return Err(CacheError::Io {
                    path: path.to_string(),
                    source: e,
                });
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&text) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %path, error = %e, "Removing corrupt cache entry");
                let _ = std::fs::remove_file(path.as_std_path());
                self.bump(|s| s.misses += 1);
                return Ok(None);
            }
        };

        let age = Utc::now().signed_duration_since(entry.created_at);
        if age.num_seconds() < 0 || age.to_std().is_ok_and(|a| a > self.ttl) {
            debug!(fingerprint = %fingerprint, "Cache entry expired");
            let _ = std::fs::remove_file(path.as_std_path());
            self.bump(|s| {
                s.expirations += 1;
                s.misses += 1;
            });
            return Ok(None);
        }

        // The artifact itself may have been cleaned up out from under us.
        if !entry.artifact_path.as_std_path().exists() {
            warn!(fingerprint = %fingerprint, artifact = %entry.artifact_path,
                "Cache entry points at missing artifact; treating as miss");
            let _ = std::fs::remove_file(path.as_std_path());
            self.bump(|s| s.misses += 1);
            return Ok(None);
        }

        self.bump(|s| s.hits += 1);
        Ok(Some(entry))
    }

    /// Store an entry under a fingerprint.
    ///
    /// First writer wins: when an entry already exists and `overwrite` is
    /// false the call is a no-op returning `false`. With `overwrite`
    /// (explicit cache bypass) the new entry atomically supersedes the old.
    ///
    /// # Errors
    /// Returns [`CacheError`] on serialization or I/O failure.
    pub fn store(
        &self,
        fingerprint: &Fingerprint,
        entry: &CacheEntry,
        overwrite: bool,
    ) -> Result<bool, CacheError> {
        let path = self.entry_path(fingerprint);

        if !overwrite && path.as_std_path().exists() {
            debug!(fingerprint = %fingerprint, "Cache entry exists, keeping first write");
            return Ok(false);
        }

        let json = serde_json::to_string_pretty(entry).map_err(|e| CacheError::Corrupt {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        write_file_atomic(&path, &json).map_err(|e| CacheError::Io {
            path: path.to_string(),
            source: std::io::Error::other(e.to_string()),
        })?;

        self.bump(|s| s.writes += 1);
        debug!(fingerprint = %fingerprint, "Stored cache entry");
        Ok(true)
    }

    /// Remove the entry for a fingerprint, if present.
    ///
    /// # Errors
    /// Returns [`CacheError::Io`] for I/O failures other than not-found.
    pub fn invalidate(&self, fingerprint: &Fingerprint) -> Result<bool, CacheError> {
        let path = self.entry_path(fingerprint);
        match std::fs::remove_file(path.as_std_path()) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::Io {
                path: path.to_string(),
                source: e,
            }),
        }
    }

    /// Cache directory this store operates on.
    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        &self.cache_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fingerprint(tag: &str) -> Fingerprint {
        use crate::{CanonicalRequest, CanonicalSource};
        Fingerprint::compute(&CanonicalRequest {
            sources: vec![CanonicalSource::Url {
                url: format!("https://example.com/{tag}"),
            }],
            output_kind: "pdf".into(),
            provider: "anthropic".into(),
            model: "m".into(),
            image_model: None,
            audience: "general".into(),
            temperature_milli: 200,
            max_tokens: 2048,
            max_slides: 15,
            max_summary_points: 8,
        })
        .unwrap()
    }

    fn entry(fp: &Fingerprint, dir: &TempDir) -> CacheEntry {
        let artifact_path =
            Utf8PathBuf::from_path_buf(dir.path().join("artifact.pdf")).unwrap();
        std::fs::write(&artifact_path, b"%PDF-1.7 body").unwrap();
        CacheEntry {
            fingerprint: fp.to_string(),
            artifact_path,
            content_hash: "abc".into(),
            size_bytes: 13,
            title: "Doc".into(),
            pages: Some(2),
            slides: None,
            usage: TokenUsage::default(),
            created_at: Utc::now(),
        }
    }

    fn open_store(dir: &TempDir, ttl: Duration) -> CacheStore {
        let cache_dir = Utf8PathBuf::from_path_buf(dir.path().join("cache")).unwrap();
        CacheStore::open(cache_dir, ttl).unwrap()
    }

    #[test]
    fn test_store_then_lookup() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, Duration::from_secs(3600));
        let fp = fingerprint("a");
        let entry = entry(&fp, &dir);

        assert!(store.lookup(&fp).unwrap().is_none());
        assert!(store.store(&fp, &entry, false).unwrap());
        let found = store.lookup(&fp).unwrap().unwrap();
        assert_eq!(found, entry);

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.writes, 1);
    }

    #[test]
    fn test_first_writer_wins() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, Duration::from_secs(3600));
        let fp = fingerprint("a");
        let first = entry(&fp, &dir);
        let mut second = first.clone();
        second.title = "Replacement".into();

        assert!(store.store(&fp, &first, false).unwrap());
        assert!(!store.store(&fp, &second, false).unwrap());
        assert_eq!(store.lookup(&fp).unwrap().unwrap().title, "Doc");

        // Explicit bypass supersedes.
        assert!(store.store(&fp, &second, true).unwrap());
        assert_eq!(store.lookup(&fp).unwrap().unwrap().title, "Replacement");
    }

    #[test]
    fn test_expired_entry_is_miss() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, Duration::from_secs(60));
        let fp = fingerprint("a");
        let mut old = entry(&fp, &dir);
        old.created_at = Utc::now() - chrono::Duration::hours(2);

        store.store(&fp, &old, false).unwrap();
        assert!(store.lookup(&fp).unwrap().is_none());
        assert_eq!(store.stats().expirations, 1);
        // The file was removed, so a fresh store succeeds.
        assert!(store.store(&fp, &entry(&fp, &dir), false).unwrap());
    }

    #[test]
    fn test_corrupt_entry_is_miss() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, Duration::from_secs(3600));
        let fp = fingerprint("a");
        std::fs::write(store.dir().join(format!("{fp}.json")), "{not json").unwrap();
        assert!(store.lookup(&fp).unwrap().is_none());
    }

    #[test]
    fn test_missing_artifact_is_miss() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, Duration::from_secs(3600));
        let fp = fingerprint("a");
        let mut dangling = entry(&fp, &dir);
        dangling.artifact_path = Utf8PathBuf::from("/nonexistent/ghost.pdf");

        store.store(&fp, &dangling, false).unwrap();
        assert!(store.lookup(&fp).unwrap().is_none());
    }

    #[test]
    fn test_invalidate() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, Duration::from_secs(3600));
        let fp = fingerprint("a");
        store.store(&fp, &entry(&fp, &dir), false).unwrap();

        assert!(store.invalidate(&fp).unwrap());
        assert!(!store.invalidate(&fp).unwrap());
        assert!(store.lookup(&fp).unwrap().is_none());
    }
}
