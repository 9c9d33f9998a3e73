//! Structural validation of rendered artifacts.
//!
//! Checks the produced file itself, not the renderer's claims: non-zero
//! size, minimum content length, format signature, and page/slide counts
//! within bounds. Failures are typed issues so the orchestrator's retry
//! policy and tests can inspect them.

use tracing::debug;

use prismgen_render::Artifact;
use prismgen_utils::error::ArtifactIssue;
use prismgen_utils::types::OutputKind;

/// Bounds an artifact must satisfy.
#[derive(Debug, Clone, Copy)]
pub struct Expectations {
    /// Minimum artifact size in bytes.
    pub min_bytes: usize,
    /// Maximum accepted page count for paginated formats.
    pub max_pages: u32,
    /// Maximum accepted slide count for deck formats.
    pub max_slides: u32,
}

impl Default for Expectations {
    fn default() -> Self {
        Self {
            min_bytes: 16,
            max_pages: 200,
            max_slides: 100,
        }
    }
}

/// PDF leading signature.
const PDF_MAGIC: &[u8] = b"%PDF";

/// ZIP local-file-header signature (docx/pptx containers).
const ZIP_MAGIC: &[u8] = b"PK";

/// Validates rendered artifacts against their format's structural rules.
pub struct ArtifactValidator;

impl ArtifactValidator {
    /// Validate an artifact file on disk.
    ///
    /// Returns `Ok(())` when the artifact is structurally sound, otherwise
    /// the full list of issues found.
    ///
    /// # Errors
    /// Returns the collected [`ArtifactIssue`] list on any structural
    /// defect, including an unreadable file (reported as [`ArtifactIssue::Empty`]).
    pub fn validate(
        artifact: &Artifact,
        kind: OutputKind,
        expectations: &Expectations,
    ) -> Result<(), Vec<ArtifactIssue>> {
        let mut issues = Vec::new();

        let Ok(bytes) = std::fs::read(artifact.path.as_std_path()) else {
            return Err(vec![ArtifactIssue::Empty]);
        };

        if bytes.is_empty() {
            return Err(vec![ArtifactIssue::Empty]);
        }

        if bytes.len() < expectations.min_bytes {
            issues.push(ArtifactIssue::TooShort {
                actual: bytes.len(),
                minimum: expectations.min_bytes,
            });
        }

        match kind {
            OutputKind::Pdf => {
                if !bytes.starts_with(PDF_MAGIC) {
                    issues.push(ArtifactIssue::BadSignature { expected: "%PDF" });
                }
            }
            OutputKind::Docx | OutputKind::Pptx => {
                if !bytes.starts_with(ZIP_MAGIC) {
                    issues.push(ArtifactIssue::BadSignature { expected: "PK" });
                }
            }
            OutputKind::Markdown | OutputKind::MindMap => match std::str::from_utf8(&bytes) {
                Ok(text) if text.trim().is_empty() => {
                    issues.push(ArtifactIssue::NotParseable {
                        reason: "markdown artifact is blank".to_string(),
                    });
                }
                Ok(_) => {}
                Err(e) => issues.push(ArtifactIssue::NotParseable {
                    reason: format!("invalid UTF-8: {e}"),
                }),
            },
        }

        if let Some(pages) = artifact.metadata.pages
            && (pages == 0 || pages > expectations.max_pages)
        {
            issues.push(ArtifactIssue::PageCountOutOfRange {
                actual: pages,
                max: expectations.max_pages,
            });
        }

        if let Some(slides) = artifact.metadata.slides
            && (slides == 0 || slides > expectations.max_slides)
        {
            issues.push(ArtifactIssue::SlideCountOutOfRange {
                actual: slides,
                max: expectations.max_slides,
            });
        }

        if issues.is_empty() {
            debug!(path = %artifact.path, kind = %kind, "Artifact passed validation");
            Ok(())
        } else {
            Err(issues)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use prismgen_render::ArtifactMetadata;
    use tempfile::TempDir;

    fn write_artifact(dir: &TempDir, name: &str, bytes: &[u8]) -> Artifact {
        let path = Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap();
        std::fs::write(&path, bytes).unwrap();
        Artifact::from_written_bytes(path, bytes, ArtifactMetadata::default())
    }

    #[test]
    fn test_valid_markdown_passes() {
        let dir = TempDir::new().unwrap();
        let artifact = write_artifact(&dir, "doc.md", b"# Title\n\nSome body text here.\n");
        let result =
            ArtifactValidator::validate(&artifact, OutputKind::Markdown, &Expectations::default());
        assert!(result.is_ok(), "expected valid, got: {result:?}");
    }

    #[test]
    fn test_empty_artifact_rejected() {
        let dir = TempDir::new().unwrap();
        let artifact = write_artifact(&dir, "empty.pdf", b"");
        let issues =
            ArtifactValidator::validate(&artifact, OutputKind::Pdf, &Expectations::default())
                .unwrap_err();
        assert_eq!(issues, vec![ArtifactIssue::Empty]);
    }

    #[test]
    fn test_missing_file_rejected() {
        let artifact = Artifact::from_written_bytes(
            "/nonexistent/never.pdf".into(),
            b"placeholder",
            ArtifactMetadata::default(),
        );
        assert!(
            ArtifactValidator::validate(&artifact, OutputKind::Pdf, &Expectations::default())
                .is_err()
        );
    }

    #[test]
    fn test_pdf_signature_checked() {
        let dir = TempDir::new().unwrap();
        let artifact = write_artifact(&dir, "fake.pdf", b"this is not a pdf at all, honestly");
        let issues =
            ArtifactValidator::validate(&artifact, OutputKind::Pdf, &Expectations::default())
                .unwrap_err();
        assert!(issues.contains(&ArtifactIssue::BadSignature { expected: "%PDF" }));

        let artifact = write_artifact(&dir, "real.pdf", b"%PDF-1.7 pretend body long enough");
        assert!(
            ArtifactValidator::validate(&artifact, OutputKind::Pdf, &Expectations::default())
                .is_ok()
        );
    }

    #[test]
    fn test_zip_signature_for_office_formats() {
        let dir = TempDir::new().unwrap();
        let artifact = write_artifact(&dir, "deck.pptx", b"PK\x03\x04 zip-ish body padding");
        assert!(
            ArtifactValidator::validate(&artifact, OutputKind::Pptx, &Expectations::default())
                .is_ok()
        );
    }

    #[test]
    fn test_page_count_bounds() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("big.pdf")).unwrap();
        let bytes = b"%PDF-1.7 something long enough here";
        std::fs::write(&path, bytes).unwrap();
        let artifact = Artifact::from_written_bytes(
            path,
            bytes,
            ArtifactMetadata {
                title: "t".into(),
                pages: Some(999),
                slides: None,
            },
        );

        let issues =
            ArtifactValidator::validate(&artifact, OutputKind::Pdf, &Expectations::default())
                .unwrap_err();
        assert!(issues.iter().any(|i| matches!(
            i,
            ArtifactIssue::PageCountOutOfRange { actual: 999, .. }
        )));
    }

    #[test]
    fn test_zero_slides_out_of_range() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("deck.pptx")).unwrap();
        let bytes = b"PK\x03\x04 zip-ish body padding";
        std::fs::write(&path, bytes).unwrap();
        let artifact = Artifact::from_written_bytes(
            path,
            bytes,
            ArtifactMetadata {
                title: "t".into(),
                pages: None,
                slides: Some(0),
            },
        );

        let issues =
            ArtifactValidator::validate(&artifact, OutputKind::Pptx, &Expectations::default())
                .unwrap_err();
        assert!(issues
            .iter()
            .any(|i| matches!(i, ArtifactIssue::SlideCountOutOfRange { actual: 0, .. })));
    }
}
