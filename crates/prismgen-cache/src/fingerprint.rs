//! Request fingerprinting.
//!
//! The fingerprint is BLAKE3 over the JCS-canonical JSON of a
//! [`CanonicalRequest`]. Canonicalization makes logically identical
//! requests byte-identical before hashing: pasted text is NFC/line-ending
//! normalized and content-hashed, file sources hash their bytes rather
//! than their filename, URLs are trimmed. Every option that affects
//! rendered content must be part of the canonical form; cache policy is
//! deliberately not.

use serde::{Deserialize, Serialize};
use tracing::warn;

use prismgen_extraction::SourceItem;
use prismgen_utils::canonicalization::{blake3_hex, hash_canonical, normalize_text};
use prismgen_utils::error::CacheError;

/// Canonical form of one source item, reduced to content identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CanonicalSource {
    /// Inline text, identified by the hash of its normalized content.
    Text { hash: String },
    /// URL, trimmed of surrounding whitespace.
    Url { url: String },
    /// File, identified by the hash of its bytes when readable, else by
    /// its path (the subsequent extraction will fail with an input error
    /// anyway, but fingerprinting itself must not).
    File { hash: String },
}

impl CanonicalSource {
    /// Canonicalize one source item.
    #[must_use]
    pub fn from_item(item: &SourceItem) -> Self {
        match item {
            SourceItem::Text { content } => Self::Text {
                hash: blake3_hex(normalize_text(content).as_bytes()),
            },
            SourceItem::Url { url } => Self::Url {
                url: url.trim().to_string(),
            },
            SourceItem::File { path } => match std::fs::read(path.as_std_path()) {
                Ok(bytes) => Self::File {
                    hash: blake3_hex(&bytes),
                },
                Err(e) => {
                    warn!(path = %path, error = %e, "Fingerprinting unreadable file by path");
                    Self::File {
                        hash: format!("path:{path}"),
                    }
                }
            },
        }
    }
}

/// Canonical form of a generation request: exactly the inputs that affect
/// rendered content, nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRequest {
    /// Canonicalized sources in request order.
    pub sources: Vec<CanonicalSource>,
    pub output_kind: String,
    pub provider: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_model: Option<String>,
    pub audience: String,
    /// Sampling temperature, serialized with fixed precision so float
    /// formatting can never split identical requests.
    pub temperature_milli: u32,
    pub max_tokens: u32,
    pub max_slides: u32,
    pub max_summary_points: u32,
}

/// Deterministic content-addressed key for a generation request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint of a canonical request.
    ///
    /// Pure and deterministic: same logical request, same hash.
    ///
    /// # Errors
    /// Returns [`CacheError::Fingerprint`] if canonical serialization fails
    /// (which only happens for non-serializable values, i.e. never for
    /// [`CanonicalRequest`] in practice).
    pub fn compute(request: &CanonicalRequest) -> Result<Self, CacheError> {
        hash_canonical(request)
            .map(Self)
            .map_err(|e| CacheError::Fingerprint(e.to_string()))
    }

    /// Hex form of the fingerprint.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
