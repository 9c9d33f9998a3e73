//! Error taxonomy for the generation pipeline.
//!
//! Every layer has its own `thiserror` enum; terminal stream errors carry a
//! coarse, stable [`ErrorCode`] plus a human-readable message. Internal
//! detail stays in server-side logs and never reaches the event stream.

use std::time::Duration;
use thiserror::Error;

/// Stable, client-facing error codes.
///
/// These strings are a wire contract: clients switch on them, so variants are
/// append-only and the string forms never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Unsupported or unreadable source item.
    InvalidSource,
    /// Content extraction gateway failed; treated as caller input error.
    ExtractionFailed,
    /// Provider rejected the supplied credentials.
    ProviderAuth,
    /// Provider rate limit or quota exhausted.
    ProviderQuota,
    /// Provider service outage or transport failure.
    ProviderUnavailable,
    /// Model output could not be parsed into a content model.
    MalformedModelOutput,
    /// Artifact renderer failed.
    RenderFailed,
    /// Rendered artifact failed structural validation.
    ValidationFailed,
    /// Session exceeded its overall timeout.
    Timeout,
    /// Session was cancelled by the client.
    Cancelled,
    /// An identical request is already building; resolve via its outcome.
    BuildInProgress,
    /// Shared retry budget exhausted.
    RetryExhausted,
    /// Invalid session state for the requested canvas operation.
    InvalidState,
    /// Anything else.
    Internal,
}

impl ErrorCode {
    /// Stable wire string for this code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidSource => "INVALID_SOURCE",
            Self::ExtractionFailed => "EXTRACTION_FAILED",
            Self::ProviderAuth => "PROVIDER_AUTH",
            Self::ProviderQuota => "PROVIDER_QUOTA",
            Self::ProviderUnavailable => "PROVIDER_UNAVAILABLE",
            Self::MalformedModelOutput => "MALFORMED_MODEL_OUTPUT",
            Self::RenderFailed => "RENDER_FAILED",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::Timeout => "TIMEOUT",
            Self::Cancelled => "CANCELLED",
            Self::BuildInProgress => "BUILD_IN_PROGRESS",
            Self::RetryExhausted => "RETRY_EXHAUSTED",
            Self::InvalidState => "INVALID_STATE",
            Self::Internal => "INTERNAL",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from LLM backend operations.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport-level failure (HTTP connectivity, malformed response body).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider authentication failure (401, 403, missing API key).
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider quota/rate limit exceeded (429).
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// Provider service outage (5xx after retries).
    #[error("Provider outage: {0}")]
    ProviderOutage(String),

    /// Invocation timed out.
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// Configuration error (bad base URL, missing model).
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),

    /// Unsupported feature or provider.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl LlmError {
    /// Whether the orchestrator may retry this failure against the shared
    /// retry budget. Auth and quota failures escalate immediately.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::ProviderOutage(_) | Self::Timeout { .. }
        )
    }

    /// Coarse code surfaced on terminal error events.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Transport(_) | Self::ProviderOutage(_) => ErrorCode::ProviderUnavailable,
            Self::ProviderAuth(_) => ErrorCode::ProviderAuth,
            Self::ProviderQuota(_) => ErrorCode::ProviderQuota,
            Self::Timeout { .. } => ErrorCode::Timeout,
            Self::Misconfiguration(_) | Self::Unsupported(_) => ErrorCode::Internal,
        }
    }
}

/// Errors from the content extraction gateway.
///
/// Extraction failures are caller input errors: the orchestrator never
/// retries them.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    #[error("Failed to read source '{source_id}': {reason}")]
    ReadFailed { source_id: String, reason: String },

    #[error("No extractor configured for {kind} sources")]
    NoExtractor { kind: String },

    #[error("Extracted content is empty")]
    EmptyContent,
}

impl ExtractionError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedSource(_) | Self::NoExtractor { .. } => ErrorCode::InvalidSource,
            Self::ReadFailed { .. } | Self::EmptyContent => ErrorCode::ExtractionFailed,
        }
    }
}

/// Errors from the artifact renderer gateway.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Renderer failed: {0}")]
    RendererFailed(String),

    #[error("No renderer registered for output kind '{kind}'")]
    NoRenderer { kind: String },

    #[error("Failed to write artifact at {path}: {reason}")]
    WriteFailed { path: String, reason: String },
}

/// A single structural defect found in a rendered artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactIssue {
    /// Artifact file is empty.
    Empty,
    /// Artifact body is shorter than the minimum for its kind.
    TooShort { actual: usize, minimum: usize },
    /// Leading bytes do not match the format signature.
    BadSignature { expected: &'static str },
    /// Page count outside the accepted range.
    PageCountOutOfRange { actual: u32, max: u32 },
    /// Slide count outside the accepted range.
    SlideCountOutOfRange { actual: u32, max: u32 },
    /// Markdown artifact is not valid UTF-8 or is blank.
    NotParseable { reason: String },
}

impl std::fmt::Display for ArtifactIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "artifact is empty"),
            Self::TooShort { actual, minimum } => {
                write!(f, "artifact too short: {actual} bytes (minimum {minimum})")
            }
            Self::BadSignature { expected } => {
                write!(f, "artifact does not start with expected signature {expected:?}")
            }
            Self::PageCountOutOfRange { actual, max } => {
                write!(f, "page count {actual} outside range 1..={max}")
            }
            Self::SlideCountOutOfRange { actual, max } => {
                write!(f, "slide count {actual} outside range 1..={max}")
            }
            Self::NotParseable { reason } => write!(f, "artifact not parseable: {reason}"),
        }
    }
}

impl std::error::Error for ArtifactIssue {}

/// Errors from the cache store.
///
/// Store unavailability degrades to a no-cache path; these errors are logged
/// but never fail a generation request on their own.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O failure at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt cache entry at {path}: {reason}")]
    Corrupt { path: String, reason: String },

    #[error("Fingerprint computation failed: {0}")]
    Fingerprint(String),
}

/// Top-level failure of a generation session.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Artifact validation failed: {}", issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Validation { issues: Vec<ArtifactIssue> },

    #[error("Model output is not a valid content model: {0}")]
    MalformedModelOutput(String),

    #[error("Retry budget exhausted after {attempts} re-attempts: {last_error}")]
    RetryExhausted { attempts: u32, last_error: String },

    #[error("Session timed out after {duration:?}")]
    SessionTimeout { duration: Duration },

    #[error("Session cancelled")]
    Cancelled,

    #[error("Identical request already building")]
    BuildInProgress,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Coarse code carried by the terminal `error` event.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Extraction(e) => e.code(),
            Self::Llm(e) => e.code(),
            Self::Render(_) => ErrorCode::RenderFailed,
            Self::Validation { .. } => ErrorCode::ValidationFailed,
            Self::MalformedModelOutput(_) => ErrorCode::MalformedModelOutput,
            Self::RetryExhausted { .. } => ErrorCode::RetryExhausted,
            Self::SessionTimeout { .. } => ErrorCode::Timeout,
            Self::Cancelled => ErrorCode::Cancelled,
            Self::BuildInProgress => ErrorCode::BuildInProgress,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }
}

/// Failures of canvas session operations.
#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Invalid state for {operation}: {reason}")]
    InvalidState { operation: String, reason: String },

    #[error("Question id mismatch: expected {expected}, got {got}")]
    QuestionMismatch { expected: String, got: String },

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Model response is not a usable question: {0}")]
    MalformedQuestion(String),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl CanvasError {
    /// Coarse code surfaced on canvas error events.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::SessionNotFound(_) | Self::InvalidState { .. } | Self::QuestionMismatch { .. } => {
                ErrorCode::InvalidState
            }
            Self::Llm(e) => e.code(),
            Self::MalformedQuestion(_) => ErrorCode::MalformedModelOutput,
            Self::Render(_) => ErrorCode::RenderFailed,
        }
    }
}
