//! Rendered artifact model.

use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata reported by the renderer for a produced artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Document/deck title.
    pub title: String,
    /// Page count, for paginated formats.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
    /// Slide count, for deck formats.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slides: Option<u32>,
}

/// A rendered output file.
///
/// The content hash is computed from the file bytes at creation time, so an
/// artifact reference is stable evidence of what was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Location of the produced file.
    pub path: Utf8PathBuf,
    /// BLAKE3 hex hash of the file content.
    pub content_hash: String,
    /// Size of the file in bytes.
    pub size_bytes: u64,
    /// Renderer-reported metadata.
    pub metadata: ArtifactMetadata,
    /// When the artifact was produced.
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    /// Build an artifact record from bytes that were just written to `path`.
    #[must_use]
    pub fn from_written_bytes(
        path: Utf8PathBuf,
        content: &[u8],
        metadata: ArtifactMetadata,
    ) -> Self {
        Self {
            path,
            content_hash: prismgen_utils::canonicalization::blake3_hex(content),
            size_bytes: content.len() as u64,
            metadata,
            created_at: Utc::now(),
        }
    }
}
