//! Canvas question model and model-payload parsing.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use prismgen_content::parse_model_json;
use prismgen_utils::error::CanvasError;

/// One selectable option of a closed-form question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub recommended: bool,
}

/// One approach of a trade-off question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproachOption {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
    #[serde(default)]
    pub recommended: bool,
}

/// Kind of answer the question expects. Open text is always accepted
/// regardless of kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// 3-5 enumerated options.
    SingleChoice { options: Vec<QuestionOption> },
    /// 2-4 approaches with pros/cons.
    Approach { approaches: Vec<ApproachOption> },
}

/// A question posed to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasQuestion {
    pub id: String,
    pub prompt: String,
    pub kind: QuestionKind,
    /// Why the model is asking, when it said so.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// One answered question in a session's linear history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionHistoryItem {
    pub question: CanvasQuestion,
    pub answer: String,
}

/// Raw payload the question model is prompted to return.
#[derive(Debug, Deserialize)]
struct QuestionPayload {
    #[serde(default)]
    question: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    options: Vec<RawOption>,
    #[serde(default)]
    approaches: Vec<RawApproach>,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    suggest_complete: bool,
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawOption {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    label: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    recommended: bool,
}

#[derive(Debug, Deserialize)]
struct RawApproach {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    pros: Vec<String>,
    #[serde(default)]
    cons: Vec<String>,
    #[serde(default)]
    recommended: bool,
}

/// What a question-model response means for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ModelTurn {
    /// Another question to pose.
    Question(CanvasQuestion),
    /// The model suggests the exploration is complete.
    Complete { summary: Option<String> },
}

/// Parse a model response into the next session turn.
///
/// Tolerates fenced and prose-wrapped JSON. A payload with
/// `suggest_complete: true` wins over any question fields.
///
/// # Errors
/// Returns [`CanvasError::MalformedQuestion`] when no usable payload can be
/// recovered.
pub(crate) fn parse_model_turn(raw: &str) -> Result<ModelTurn, CanvasError> {
    let payload: QuestionPayload =
        parse_model_json(raw).map_err(|e| CanvasError::MalformedQuestion(e.to_string()))?;

    if payload.suggest_complete {
        return Ok(ModelTurn::Complete {
            summary: payload.summary.filter(|s| !s.trim().is_empty()),
        });
    }

    let Some(prompt) = payload.question.filter(|q| !q.trim().is_empty()) else {
        return Err(CanvasError::MalformedQuestion(
            "response has neither a question nor a completion signal".to_string(),
        ));
    };

    let kind = match payload.kind.as_deref() {
        Some("approach") => QuestionKind::Approach {
            approaches: payload
                .approaches
                .into_iter()
                .map(|a| ApproachOption {
                    id: a.id.unwrap_or_else(|| short_id("appr")),
                    title: a.title,
                    description: a.description,
                    pros: a.pros,
                    cons: a.cons,
                    recommended: a.recommended,
                })
                .collect(),
        },
        // The prompt forbids other kinds; anything else degrades to
        // single_choice with whatever options were supplied.
        _ => QuestionKind::SingleChoice {
            options: payload
                .options
                .into_iter()
                .map(|o| QuestionOption {
                    id: o.id.unwrap_or_else(|| short_id("opt")),
                    label: o.label,
                    description: o.description,
                    recommended: o.recommended,
                })
                .collect(),
        },
    };

    Ok(ModelTurn::Question(CanvasQuestion {
        id: short_id("q"),
        prompt,
        kind,
        context: payload.context,
    }))
}

/// `prefix_<hex>` short identifier.
pub(crate) fn short_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}", &hex[..8])
}

/// `sess_<hex12>` session identifier.
pub(crate) fn session_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("sess_{}", &hex[..12])
}
