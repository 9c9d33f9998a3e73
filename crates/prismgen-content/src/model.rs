//! Typed intermediate content models.

use serde::{Deserialize, Serialize};

/// One section of a page document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSection {
    pub heading: String,
    /// Markdown body text.
    pub body: String,
}

/// One slide of a deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    pub title: String,
    #[serde(default)]
    pub bullets: Vec<String>,
    /// Optional speaker notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Node of a mind-map outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindMapNode {
    pub label: String,
    #[serde(default)]
    pub children: Vec<MindMapNode>,
}

impl MindMapNode {
    /// Total node count including this node.
    #[must_use]
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(MindMapNode::count).sum::<usize>()
    }
}

/// The intermediate content model produced by the transformation stage.
///
/// Tagged with `kind` so a rendered-from-JSON model is self-describing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentModel {
    /// Sections of a page document (pdf, docx, markdown).
    Document {
        title: String,
        sections: Vec<DocumentSection>,
    },
    /// Slides of a deck (pptx).
    SlideDeck { title: String, slides: Vec<Slide> },
    /// Hierarchical outline (mindmap).
    MindMap { root: MindMapNode },
}

impl ContentModel {
    /// Title of the model, when it carries one.
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Document { title, .. } | Self::SlideDeck { title, .. } => title,
            Self::MindMap { root } => &root.label,
        }
    }

    /// Whether the model has any content to render.
    ///
    /// An empty model is a malformed transformation result: the orchestrator
    /// treats it the same as unparseable output.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Document { sections, .. } => {
                sections.is_empty() || sections.iter().all(|s| s.body.trim().is_empty())
            }
            Self::SlideDeck { slides, .. } => slides.is_empty(),
            Self::MindMap { root } => root.children.is_empty(),
        }
    }

    /// Number of renderable units (sections, slides, or nodes).
    #[must_use]
    pub fn unit_count(&self) -> usize {
        match self {
            Self::Document { sections, .. } => sections.len(),
            Self::SlideDeck { slides, .. } => slides.len(),
            Self::MindMap { root } => root.count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> ContentModel {
        ContentModel::Document {
            title: "Quarterly Report".into(),
            sections: vec![DocumentSection {
                heading: "Summary".into(),
                body: "Revenue grew.".into(),
            }],
        }
    }

    #[test]
    fn test_round_trip_tagging() {
        let json = serde_json::to_string(&document()).unwrap();
        assert!(json.contains(r#""kind":"document""#));
        let back: ContentModel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, document());
    }

    #[test]
    fn test_empty_detection() {
        assert!(!document().is_empty());
        let empty = ContentModel::Document {
            title: "t".into(),
            sections: vec![],
        };
        assert!(empty.is_empty());
        let blank = ContentModel::Document {
            title: "t".into(),
            sections: vec![DocumentSection {
                heading: "h".into(),
                body: "   ".into(),
            }],
        };
        assert!(blank.is_empty());
    }

    #[test]
    fn test_mindmap_count() {
        let root = MindMapNode {
            label: "root".into(),
            children: vec![
                MindMapNode {
                    label: "a".into(),
                    children: vec![MindMapNode {
                        label: "a1".into(),
                        children: vec![],
                    }],
                },
                MindMapNode {
                    label: "b".into(),
                    children: vec![],
                },
            ],
        };
        assert_eq!(root.count(), 4);
        let model = ContentModel::MindMap { root };
        assert_eq!(model.unit_count(), 4);
        assert!(!model.is_empty());
    }
}
