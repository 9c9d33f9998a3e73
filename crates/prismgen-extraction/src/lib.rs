//! Source items and the content extraction gateway.
//!
//! Extraction normalizes every source (file, URL, pasted text) into plain
//! markdown-ish text. The concrete PDF/DOCX/HTML parsers are external
//! collaborators behind the [`ContentExtractor`] trait; inline text is
//! handled built-in. Extraction failures are caller input errors and are
//! never retried by the orchestrator.

use async_trait::async_trait;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use tracing::debug;

use prismgen_utils::error::ExtractionError;

/// One input source of a generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceItem {
    /// Reference to an uploaded file.
    File { path: Utf8PathBuf },
    /// Web page to fetch and convert.
    Url { url: String },
    /// Pasted inline text.
    Text { content: String },
}

impl SourceItem {
    /// Classify this source. Classification is total: every variant has a
    /// kind, so the detecting stage cannot fail.
    #[must_use]
    pub const fn kind(&self) -> SourceKind {
        match self {
            Self::File { .. } => SourceKind::File,
            Self::Url { .. } => SourceKind::Url,
            Self::Text { .. } => SourceKind::Text,
        }
    }

    /// Short display form for progress messages (never includes content).
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::File { path } => format!("file:{path}"),
            Self::Url { url } => format!("url:{url}"),
            Self::Text { content } => format!("text:{} chars", content.len()),
        }
    }
}

/// Source classification produced by the detecting stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    File,
    Url,
    Text,
}

impl SourceKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Url => "url",
            Self::Text => "text",
        }
    }
}

/// Normalized output of extracting one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedContent {
    /// Plain structured text (markdown-ish).
    pub text: String,
    /// Title when the parser recovered one.
    pub title: Option<String>,
}

impl ExtractedContent {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            title: None,
        }
    }
}

/// Gateway to an external content extraction capability.
///
/// Implementations wrap concrete parsers (PDF, DOCX, HTML fetchers) and
/// return normalized text. They must not panic on malformed input; every
/// failure maps to an [`ExtractionError`].
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Extract normalized text from a single source.
    ///
    /// # Errors
    /// Returns [`ExtractionError`] when the source is unreadable or
    /// unsupported.
    async fn extract(&self, item: &SourceItem) -> Result<ExtractedContent, ExtractionError>;
}

/// Built-in extractor for inline text sources.
///
/// Pass-through with whitespace normalization: CRLF to LF, trailing
/// whitespace trimmed. File and URL sources are rejected; those require an
/// external extractor.
#[derive(Debug, Default)]
pub struct TextExtractor;

#[async_trait]
impl ContentExtractor for TextExtractor {
    async fn extract(&self, item: &SourceItem) -> Result<ExtractedContent, ExtractionError> {
        match item {
            SourceItem::Text { content } => {
                let text = prismgen_utils::canonicalization::normalize_text(content);
                if text.is_empty() {
                    return Err(ExtractionError::EmptyContent);
                }
                Ok(ExtractedContent::new(text))
            }
            other => Err(ExtractionError::NoExtractor {
                kind: other.kind().as_str().to_string(),
            }),
        }
    }
}

/// Routes each source to the extractor responsible for its kind.
///
/// Inline text always works; file and URL extraction require externally
/// supplied gateways and fail as input errors when absent.
pub struct ExtractionGateway {
    text: TextExtractor,
    file: Option<Box<dyn ContentExtractor>>,
    url: Option<Box<dyn ContentExtractor>>,
}

impl ExtractionGateway {
    /// Gateway with only the built-in text extractor.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            text: TextExtractor,
            file: None,
            url: None,
        }
    }

    /// Register an external file parser.
    #[must_use]
    pub fn with_file_extractor(mut self, extractor: Box<dyn ContentExtractor>) -> Self {
        self.file = Some(extractor);
        self
    }

    /// Register an external URL fetcher/converter.
    #[must_use]
    pub fn with_url_extractor(mut self, extractor: Box<dyn ContentExtractor>) -> Self {
        self.url = Some(extractor);
        self
    }

    /// Extract one source.
    ///
    /// # Errors
    /// Returns [`ExtractionError`] for unsupported kinds or parser failures.
    pub async fn extract(&self, item: &SourceItem) -> Result<ExtractedContent, ExtractionError> {
        match item.kind() {
            SourceKind::Text => self.text.extract(item).await,
            SourceKind::File => match &self.file {
                Some(extractor) => extractor.extract(item).await,
                None => Err(ExtractionError::NoExtractor {
                    kind: "file".to_string(),
                }),
            },
            SourceKind::Url => match &self.url {
                Some(extractor) => extractor.extract(item).await,
                None => Err(ExtractionError::NoExtractor {
                    kind: "url".to_string(),
                }),
            },
        }
    }

    /// Extract all sources in request order and join them with blank lines.
    ///
    /// The first failure aborts collection: partial source sets must not be
    /// silently transformed.
    ///
    /// # Errors
    /// Returns the first [`ExtractionError`] encountered, or
    /// [`ExtractionError::EmptyContent`] when the combined text is empty.
    pub async fn collect(&self, sources: &[SourceItem]) -> Result<String, ExtractionError> {
        let mut blocks = Vec::with_capacity(sources.len());

        for item in sources {
            debug!(source = %item.describe(), "Extracting source");
            let extracted = self.extract(item).await?;
            blocks.push(extracted.text);
        }

        let combined = blocks.join("\n\n");
        if combined.trim().is_empty() {
            return Err(ExtractionError::EmptyContent);
        }
        Ok(combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_text_extraction_normalizes() {
        let gateway = ExtractionGateway::builtin();
        let out = gateway
            .extract(&SourceItem::Text {
                content: "hello  \r\nworld\r\n".into(),
            })
            .await
            .unwrap();
        assert_eq!(out.text, "hello\nworld");
    }

    #[tokio::test]
    async fn test_file_without_extractor_is_input_error() {
        let gateway = ExtractionGateway::builtin();
        let err = gateway
            .extract(&SourceItem::File {
                path: "report.pdf".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::NoExtractor { .. }));
    }

    #[tokio::test]
    async fn test_collect_preserves_order() {
        let gateway = ExtractionGateway::builtin();
        let sources = vec![
            SourceItem::Text {
                content: "first".into(),
            },
            SourceItem::Text {
                content: "second".into(),
            },
        ];
        let combined = gateway.collect(&sources).await.unwrap();
        assert_eq!(combined, "first\n\nsecond");
    }

    #[tokio::test]
    async fn test_collect_aborts_on_first_failure() {
        let gateway = ExtractionGateway::builtin();
        let sources = vec![
            SourceItem::Text {
                content: "ok".into(),
            },
            SourceItem::Url {
                url: "https://example.com".into(),
            },
        ];
        assert!(gateway.collect(&sources).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let gateway = ExtractionGateway::builtin();
        let err = gateway
            .extract(&SourceItem::Text {
                content: "   \n\n".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::EmptyContent));
    }

    #[test]
    fn test_describe_never_embeds_text_content() {
        let item = SourceItem::Text {
            content: "super secret".into(),
        };
        assert!(!item.describe().contains("secret"));
    }
}
