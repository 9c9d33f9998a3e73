//! Transformation prompts per output kind.
//!
//! The prompt instructs the model to emit the tagged [`ContentModel`] JSON
//! shape directly, so a successful parse is also a valid model.

use prismgen_utils::types::{Audience, OutputKind};

/// Builder for the transformation stage's system/user prompt pair.
#[derive(Debug, Clone)]
pub struct TransformPrompt {
    kind: OutputKind,
    audience: Audience,
    max_slides: u32,
    max_summary_points: u32,
}

impl TransformPrompt {
    #[must_use]
    pub fn new(kind: OutputKind) -> Self {
        Self {
            kind,
            audience: Audience::default(),
            max_slides: 15,
            max_summary_points: 8,
        }
    }

    #[must_use]
    pub fn with_audience(mut self, audience: Audience) -> Self {
        self.audience = audience;
        self
    }

    #[must_use]
    pub fn with_max_slides(mut self, max_slides: u32) -> Self {
        self.max_slides = max_slides.max(1);
        self
    }

    #[must_use]
    pub fn with_max_summary_points(mut self, max_summary_points: u32) -> Self {
        self.max_summary_points = max_summary_points.max(1);
        self
    }

    /// System prompt describing the target shape and constraints.
    #[must_use]
    pub fn system(&self) -> String {
        let audience_line = match self.audience {
            Audience::General => "Write for a general audience: plain language, no jargon.",
            Audience::Technical => {
                "Write for a technical audience: precise terminology, concrete detail."
            }
            Audience::Executive => {
                "Write for an executive audience: lead with outcomes, keep it brief."
            }
        };

        let shape = match self.kind {
            OutputKind::Pdf | OutputKind::Docx | OutputKind::Markdown => format!(
                r#"Restructure the provided source material into a page document.

JSON OUTPUT FORMAT:
{{
  "kind": "document",
  "title": "Document title",
  "sections": [
    {{"heading": "Section heading", "body": "Markdown body text"}}
  ]
}}

Use at most {} sections. Every section body must come from the source
material; do not invent facts."#,
                self.max_summary_points
            ),
            OutputKind::Pptx => format!(
                r#"Restructure the provided source material into a slide deck.

JSON OUTPUT FORMAT:
{{
  "kind": "slide_deck",
  "title": "Deck title",
  "slides": [
    {{"title": "Slide title", "bullets": ["point", "point"], "notes": "optional speaker notes"}}
  ]
}}

Use at most {} slides with 3-5 bullets each. Every bullet must come from
the source material; do not invent facts."#,
                self.max_slides
            ),
            OutputKind::MindMap => r#"Restructure the provided source material into a mind map.

JSON OUTPUT FORMAT:
{
  "kind": "mind_map",
  "root": {"label": "Central topic", "children": [
    {"label": "Branch", "children": [{"label": "Leaf", "children": []}]}
  ]}
}

Keep labels under 10 words. Every node must come from the source material;
do not invent facts."#
                .to_string(),
        };

        format!(
            "You are an expert document architect. {audience_line}\n\n{shape}\n\nReturn ONLY valid JSON, no markdown formatting."
        )
    }

    /// User prompt carrying the extracted source text.
    #[must_use]
    pub fn user(&self, extracted_text: &str) -> String {
        format!(
            "SOURCE MATERIAL:\n\n{extracted_text}\n\nRestructure this material as specified. Return the result as JSON."
        )
    }
}
