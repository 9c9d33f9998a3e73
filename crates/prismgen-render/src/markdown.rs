//! Built-in markdown renderer.
//!
//! Serves `markdown` and `mindmap` output kinds and canvas reports. Pages
//! are not a concept here, so metadata reports section/slide units instead.

use async_trait::async_trait;
use camino::Utf8Path;
use tracing::debug;

use crate::{Artifact, ArtifactMetadata, ArtifactRenderer};
use prismgen_content::{ContentModel, MindMapNode};
use prismgen_utils::atomic_write::write_bytes_atomic;
use prismgen_utils::error::RenderError;

/// Renders content models to markdown files.
#[derive(Debug, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    fn render_document(
        title: &str,
        sections: &[prismgen_content::DocumentSection],
    ) -> String {
        let mut out = format!("# {title}\n");
        for section in sections {
            out.push_str(&format!("\n## {}\n\n{}\n", section.heading, section.body));
        }
        out
    }

    fn render_deck(title: &str, slides: &[prismgen_content::Slide]) -> String {
        let mut out = format!("# {title}\n");
        for (i, slide) in slides.iter().enumerate() {
            out.push_str(&format!("\n---\n\n## Slide {}: {}\n\n", i + 1, slide.title));
            for bullet in &slide.bullets {
                out.push_str(&format!("- {bullet}\n"));
            }
            if let Some(notes) = &slide.notes {
                out.push_str(&format!("\n> Notes: {notes}\n"));
            }
        }
        out
    }

    fn render_node(node: &MindMapNode, depth: usize, out: &mut String) {
        out.push_str(&format!("{}- {}\n", "  ".repeat(depth), node.label));
        for child in &node.children {
            Self::render_node(child, depth + 1, out);
        }
    }

    fn render_mindmap(root: &MindMapNode) -> String {
        let mut out = format!("# {}\n\n", root.label);
        for child in &root.children {
            Self::render_node(child, 0, &mut out);
        }
        out
    }
}

#[async_trait]
impl ArtifactRenderer for MarkdownRenderer {
    async fn render(
        &self,
        model: &ContentModel,
        output_path: &Utf8Path,
    ) -> Result<Artifact, RenderError> {
        let (body, metadata) = match model {
            ContentModel::Document { title, sections } => (
                Self::render_document(title, sections),
                ArtifactMetadata {
                    title: title.clone(),
                    pages: Some(sections.len() as u32),
                    slides: None,
                },
            ),
            ContentModel::SlideDeck { title, slides } => (
                Self::render_deck(title, slides),
                ArtifactMetadata {
                    title: title.clone(),
                    pages: None,
                    slides: Some(slides.len() as u32),
                },
            ),
            ContentModel::MindMap { root } => (
                Self::render_mindmap(root),
                ArtifactMetadata {
                    title: root.label.clone(),
                    pages: None,
                    slides: None,
                },
            ),
        };

        write_bytes_atomic(output_path, body.as_bytes()).map_err(|e| {
            RenderError::WriteFailed {
                path: output_path.to_string(),
                reason: e.to_string(),
            }
        })?;

        debug!(path = %output_path, bytes = body.len(), "Rendered markdown artifact");

        Ok(Artifact::from_written_bytes(
            output_path.to_owned(),
            body.as_bytes(),
            metadata,
        ))
    }
}
