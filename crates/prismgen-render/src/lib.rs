//! Artifact model and the renderer gateway.
//!
//! Concrete page-document and slide-deck renderers are external
//! collaborators behind the [`ArtifactRenderer`] trait. The built-in
//! markdown renderer serves `markdown`/`mindmap` outputs and canvas
//! reports.

mod artifact;
mod markdown;
mod registry;

pub use artifact::{Artifact, ArtifactMetadata};
pub use markdown::MarkdownRenderer;
pub use registry::RendererRegistry;

use async_trait::async_trait;
use camino::Utf8Path;

use prismgen_content::ContentModel;
use prismgen_utils::error::RenderError;

/// Gateway to an artifact rendering capability.
///
/// Implementations turn a [`ContentModel`] into a concrete file at the
/// given path and report artifact metadata. Renderers must write
/// atomically: a failed render leaves no partial file behind.
#[async_trait]
pub trait ArtifactRenderer: Send + Sync {
    /// Render the model into a file at `output_path`.
    ///
    /// # Errors
    /// Returns [`RenderError`] when rendering or writing fails.
    async fn render(
        &self,
        model: &ContentModel,
        output_path: &Utf8Path,
    ) -> Result<Artifact, RenderError>;
}
