//! Intermediate content model between transformation and rendering.
//!
//! The transformation stage asks a model to restructure extracted text into
//! one of these typed shapes; renderers consume them to produce concrete
//! files. JSON recovery helpers tolerate the fences and prose that models
//! wrap around their output.

mod json;
mod model;
mod prompts;

pub use json::{extract_json_object, parse_model_json, strip_markdown_fences};
pub use model::{ContentModel, DocumentSection, MindMapNode, Slide};
pub use prompts::TransformPrompt;
