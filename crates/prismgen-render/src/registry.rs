//! Renderer lookup by output kind.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{ArtifactRenderer, MarkdownRenderer};
use prismgen_utils::error::RenderError;
use prismgen_utils::types::OutputKind;

/// Maps output kinds to their renderer.
///
/// `markdown` and `mindmap` are always served by the built-in markdown
/// renderer; `pdf`/`docx`/`pptx` require externally registered renderer
/// gateways.
pub struct RendererRegistry {
    renderers: HashMap<OutputKind, Arc<dyn ArtifactRenderer>>,
}

impl RendererRegistry {
    /// Registry with only the built-in markdown renderer.
    #[must_use]
    pub fn builtin() -> Self {
        let markdown: Arc<dyn ArtifactRenderer> = Arc::new(MarkdownRenderer);
        let mut renderers: HashMap<OutputKind, Arc<dyn ArtifactRenderer>> = HashMap::new();
        renderers.insert(OutputKind::Markdown, Arc::clone(&markdown));
        renderers.insert(OutputKind::MindMap, markdown);
        Self { renderers }
    }

    /// Register (or replace) the renderer for an output kind.
    pub fn register(&mut self, kind: OutputKind, renderer: Arc<dyn ArtifactRenderer>) {
        self.renderers.insert(kind, renderer);
    }

    /// Renderer for an output kind.
    ///
    /// # Errors
    /// Returns [`RenderError::NoRenderer`] when the kind has no registered
    /// gateway.
    pub fn for_kind(&self, kind: OutputKind) -> Result<Arc<dyn ArtifactRenderer>, RenderError> {
        self.renderers
            .get(&kind)
            .cloned()
            .ok_or_else(|| RenderError::NoRenderer {
                kind: kind.as_str().to_string(),
            })
    }
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_markdown_kinds() {
        let registry = RendererRegistry::builtin();
        assert!(registry.for_kind(OutputKind::Markdown).is_ok());
        assert!(registry.for_kind(OutputKind::MindMap).is_ok());
    }

    #[test]
    fn test_missing_renderer_is_error() {
        let registry = RendererRegistry::builtin();
        let err = registry.for_kind(OutputKind::Pdf).unwrap_err();
        assert!(matches!(err, RenderError::NoRenderer { .. }));
    }

    #[test]
    fn test_register_external_renderer() {
        let mut registry = RendererRegistry::builtin();
        registry.register(OutputKind::Pdf, Arc::new(MarkdownRenderer));
        assert!(registry.for_kind(OutputKind::Pdf).is_ok());
    }
}
