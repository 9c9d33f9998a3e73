//! Core shared types for the generation pipeline.

use serde::{Deserialize, Serialize};

/// Target artifact format for a generation request.
///
/// Serializes to its lowercase string form (`"pdf"`, `"docx"`, ...), which is
/// the representation used in fingerprints, events, and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Paginated page document.
    Pdf,
    /// Word-processor document.
    Docx,
    /// Slide deck.
    Pptx,
    /// Plain markdown document (also used for canvas reports).
    Markdown,
    /// Hierarchical mind-map outline.
    MindMap,
}

impl OutputKind {
    /// Canonical lowercase name used in fingerprints and events.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Pptx => "pptx",
            Self::Markdown => "markdown",
            Self::MindMap => "mindmap",
        }
    }

    /// File extension for artifacts of this kind.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Pptx => "pptx",
            Self::Markdown | Self::MindMap => "md",
        }
    }
}

impl std::fmt::Display for OutputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OutputKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "pptx" => Ok(Self::Pptx),
            "markdown" | "md" => Ok(Self::Markdown),
            "mindmap" => Ok(Self::MindMap),
            other => Err(format!(
                "Unknown output kind '{other}'. Supported: pdf, docx, pptx, markdown, mindmap."
            )),
        }
    }
}

/// Language-model provider selected for a request.
///
/// The provider identifies which HTTP backend receives the caller-supplied
/// API key. Keys are routed to exactly this provider and are never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Anthropic,
    OpenAi,
    Gemini,
}

impl Provider {
    /// Canonical lowercase name used in fingerprints and configuration keys.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "anthropic" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAi),
            // "google" is accepted as an alias.
            "gemini" | "google" => Ok(Self::Gemini),
            other => Err(format!(
                "Unknown provider '{other}'. Supported: anthropic, openai, gemini."
            )),
        }
    }
}

/// Pipeline stage of a generation session.
///
/// Stages execute strictly in this order:
///
/// ```text
/// Detecting → Extracting → Transforming → Rendering → Validating → Complete
/// ```
///
/// `Failed` is the terminal error state reachable from any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Classifying source items by kind.
    Detecting,
    /// Normalizing sources into plain structured text.
    Extracting,
    /// Model-driven restructuring into the intermediate content model.
    Transforming,
    /// Producing the concrete output file.
    Rendering,
    /// Structural checks on the rendered artifact.
    Validating,
    /// Terminal success state.
    Complete,
    /// Terminal failure state.
    Failed,
}

impl Stage {
    /// Canonical lowercase name used in progress events.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Detecting => "detecting",
            Self::Extracting => "extracting",
            Self::Transforming => "transforming",
            Self::Rendering => "rendering",
            Self::Validating => "validating",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }

    /// Whether this stage terminates the session.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intended audience for generated content. Affects transformation prompts
/// and therefore participates in the request fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    #[default]
    General,
    Technical,
    Executive,
}

impl Audience {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Technical => "technical",
            Self::Executive => "executive",
        }
    }
}

/// Token and cost accounting captured from provider responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub tokens_input: u64,
    pub tokens_output: u64,
}

impl TokenUsage {
    /// Accumulate usage from another call.
    pub fn absorb(&mut self, other: TokenUsage) {
        self.tokens_input += other.tokens_input;
        self.tokens_output += other.tokens_output;
    }
}
