//! prismgen - generation orchestration engine for LLM-backed artifacts
//!
//! prismgen turns heterogeneous input content (files, URLs, pasted text)
//! into generated artifacts (documents, slide decks, mind maps, guided
//! idea-canvas reports) by routing content through language-model calls
//! and renderer gateways.
//!
//! The crate can be used two ways:
//! - **CLI**: `prismgen generate` and `prismgen canvas` subcommands that
//!   print the event stream as JSON lines
//! - **Library**: embed [`GenerationOrchestrator`] and
//!   [`CanvasOrchestrator`] in your own service
//!
//! # Quick Start (Library)
//!
//! ```no_run
//! use prismgen::{
//!     CachePolicy, Config, GenerationOrchestrator, GenerationPreferences,
//!     GenerationRequest, OutputKind, Provider, SourceItem,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let orchestrator = GenerationOrchestrator::new(Config::default());
//!
//! let request = GenerationRequest {
//!     sources: vec![SourceItem::Text { content: "quarterly results...".into() }],
//!     output_kind: OutputKind::Markdown,
//!     provider: Provider::Anthropic,
//!     model: "claude-sonnet-4-5".into(),
//!     image_model: None,
//!     cache: CachePolicy::default(),
//!     preferences: GenerationPreferences::default(),
//! };
//!
//! let (mut stream, _cancel) = orchestrator.generate(request, "api-key".into());
//! while let Some(event) = stream.next().await {
//!     println!("{}", event.to_json_line()?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Provider credentials are supplied per request and are never persisted
//! or logged by the core.

pub mod cli;

// Stable re-exports: the engine surface.
pub use prismgen_config::Config;
pub use prismgen_engine::{
    BackendFactory, CachePolicy, CancelHandle, GenerationOrchestrator, GenerationPreferences,
    GenerationRequest, ProviderBackendFactory,
};
pub use prismgen_events::{ArtifactRef, Event, EventStream};
pub use prismgen_extraction::{ContentExtractor, ExtractionGateway, SourceItem};
pub use prismgen_render::{Artifact, ArtifactRenderer, RendererRegistry};
pub use prismgen_utils::error::{EngineError, ErrorCode};
pub use prismgen_utils::types::{Audience, OutputKind, Provider, Stage};

// The canvas surface.
pub use prismgen_canvas::{
    CanvasEvent, CanvasOrchestrator, CanvasQuestion, CanvasReport, CanvasSession,
    CanvasStartRequest, CanvasState, CanvasTemplate,
};

// Content model and validation surfaces, for external renderer and
// extractor implementations.
pub use prismgen_content::{ContentModel, DocumentSection, MindMapNode, Slide};
pub use prismgen_llm::{LlmBackend, LlmInvocation, LlmResult, Message, Role};
pub use prismgen_validation::{ArtifactValidator, Expectations};

// Cache internals useful to embedders (fingerprint inspection, warm-up).
pub use prismgen_cache::{CacheEntry, CacheStore, Fingerprint};
