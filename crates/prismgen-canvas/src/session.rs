//! Canvas session state.
//!
//! The session holds a linear history stack: answering pushes, going back
//! pops and re-exposes the popped question. The stack (not a tree) is
//! deliberate: linear undo is the supported navigation; branch
//! re-exploration would be modeled as a tagged tree with a cursor, not
//! retrofitted here.

use serde::{Deserialize, Serialize};

use crate::question::{CanvasQuestion, QuestionHistoryItem};
use crate::templates::CanvasTemplate;
use prismgen_utils::error::CanvasError;
use prismgen_utils::types::Provider;

/// Hard cap on questions per session; reaching it forces completion.
pub const MAX_QUESTIONS: u32 = 25;

/// Lifecycle state of a canvas session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanvasState {
    /// Session created, first-question model call in flight.
    Starting,
    /// A question is exposed and awaiting an answer.
    Ready,
    /// An answer was submitted; next-question model call in flight.
    Answering,
    /// The model (or the hard cap) suggested the exploration is complete.
    SuggestComplete,
    /// The last model call failed; resumable via retry.
    Error,
}

impl CanvasState {
    /// Whether a model call is currently in flight.
    #[must_use]
    pub const fn is_call_in_flight(&self) -> bool {
        matches!(self, Self::Starting | Self::Answering)
    }
}

/// One canvas conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasSession {
    pub id: String,
    pub template: CanvasTemplate,
    pub idea: String,
    pub provider: Provider,
    pub model: String,
    pub state: CanvasState,
    /// Answered questions, oldest first.
    history: Vec<QuestionHistoryItem>,
    /// The question currently awaiting an answer.
    current_question: Option<CanvasQuestion>,
    /// Questions posed so far (monotonic; going back does not refund).
    question_count: u32,
    /// Completion summary once `SuggestComplete` is reached.
    pub completion_summary: Option<String>,
    /// Last model failure, when state is `Error`.
    pub last_error: Option<String>,
}

impl CanvasSession {
    #[must_use]
    pub fn new(
        id: String,
        template: CanvasTemplate,
        idea: String,
        provider: Provider,
        model: String,
    ) -> Self {
        Self {
            id,
            template,
            idea,
            provider,
            model,
            state: CanvasState::Starting,
            history: Vec::new(),
            current_question: None,
            question_count: 0,
            completion_summary: None,
            last_error: None,
        }
    }

    #[must_use]
    pub fn history(&self) -> &[QuestionHistoryItem] {
        &self.history
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&CanvasQuestion> {
        self.current_question.as_ref()
    }

    #[must_use]
    pub const fn question_count(&self) -> u32 {
        self.question_count
    }

    /// Whether the next question would exceed the hard cap.
    #[must_use]
    pub const fn at_question_cap(&self) -> bool {
        self.question_count >= MAX_QUESTIONS
    }

    /// Expose a new question and return to `Ready`.
    pub fn pose_question(&mut self, question: CanvasQuestion) {
        self.current_question = Some(question);
        self.question_count += 1;
        self.state = CanvasState::Ready;
        self.last_error = None;
    }

    /// Record the model's completion suggestion.
    pub fn complete(&mut self, summary: Option<String>) {
        self.current_question = None;
        self.completion_summary = summary;
        self.state = CanvasState::SuggestComplete;
        self.last_error = None;
    }

    /// Consume the current question with the user's answer, appending to
    /// history and entering `Answering`.
    ///
    /// The append happens before any model call, so a crash mid-call still
    /// preserves the submitted answer.
    ///
    /// # Errors
    /// Returns [`CanvasError::InvalidState`] when no question is pending or
    /// a call is in flight, and [`CanvasError::QuestionMismatch`] when the
    /// answered question is not the current one. Neither mutates state.
    pub fn accept_answer(
        &mut self,
        question_id: &str,
        answer: String,
    ) -> Result<(), CanvasError> {
        if self.state.is_call_in_flight() {
            return Err(CanvasError::InvalidState {
                operation: "answer".to_string(),
                reason: "a model call is already in flight".to_string(),
            });
        }
        let Some(question) = self.current_question.as_ref() else {
            return Err(CanvasError::InvalidState {
                operation: "answer".to_string(),
                reason: "session has no pending question".to_string(),
            });
        };
        if question.id != question_id {
            return Err(CanvasError::QuestionMismatch {
                expected: question.id.clone(),
                got: question_id.to_string(),
            });
        }

        let question = self.current_question.take().expect("checked above");
        self.history.push(QuestionHistoryItem { question, answer });
        self.state = CanvasState::Answering;
        Ok(())
    }

    /// Mark the in-flight model call as failed. The already-appended
    /// history item is retained; the session stays resumable.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
        self.state = CanvasState::Error;
    }

    /// Pop the most recent history item and re-expose its question.
    ///
    /// Pure local operation: no model call, no counter refund.
    ///
    /// # Errors
    /// Returns [`CanvasError::InvalidState`] when history is empty or a
    /// model call is in flight.
    pub fn go_back(&mut self) -> Result<&CanvasQuestion, CanvasError> {
        if self.state.is_call_in_flight() {
            return Err(CanvasError::InvalidState {
                operation: "go_back".to_string(),
                reason: "a model call is in flight".to_string(),
            });
        }
        let Some(item) = self.history.pop() else {
            return Err(CanvasError::InvalidState {
                operation: "go_back".to_string(),
                reason: "history is empty".to_string(),
            });
        };

        self.current_question = Some(item.question);
        self.completion_summary = None;
        self.last_error = None;
        self.state = CanvasState::Ready;
        Ok(self.current_question.as_ref().expect("just set"))
    }
}
