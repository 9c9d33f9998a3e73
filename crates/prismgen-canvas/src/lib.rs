//! Adaptive idea-canvas sessions.
//!
//! A canvas session is a long-lived, content-driven state machine: each
//! answer triggers a model call that either proposes the next question or
//! signals completion with a decision summary. Going back is a pure local
//! stack pop, cheap and model-free, deliberately asymmetric with
//! answering. A completed session can be turned into a rendered
//! report via a one-shot transform+render pass.

mod orchestrator;
mod prompts;
mod question;
mod session;
mod templates;

pub use orchestrator::{
    CanvasEvent, CanvasEventStream, CanvasOrchestrator, CanvasReport, CanvasStartRequest,
};
pub use question::{ApproachOption, CanvasQuestion, QuestionHistoryItem, QuestionKind, QuestionOption};
pub use session::{CanvasSession, CanvasState, MAX_QUESTIONS};
pub use templates::CanvasTemplate;
