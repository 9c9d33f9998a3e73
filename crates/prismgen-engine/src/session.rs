//! Per-request session bookkeeping.

use prismgen_utils::types::{Stage, TokenUsage};

/// Transient execution context for one in-flight generation request.
///
/// Created on a cache miss, destroyed once the terminal event is
/// published. Tracks the current stage, per-stage attempt counts, token
/// spend, and non-fatal errors accumulated along the way.
#[derive(Debug)]
pub struct GenerationSession {
    id: String,
    stage: Stage,
    transform_attempts: u32,
    render_attempts: u32,
    validate_attempts: u32,
    usage: TokenUsage,
    non_fatal_errors: Vec<String>,
}

impl GenerationSession {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            stage: Stage::Detecting,
            transform_attempts: 0,
            render_attempts: 0,
            validate_attempts: 0,
            usage: TokenUsage::default(),
            non_fatal_errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Move to a new stage. Stages only ever advance or fall back from
    /// render/validate to transform; the orchestrator owns legality.
    pub fn enter(&mut self, stage: Stage) {
        self.stage = stage;
    }

    pub fn record_transform_attempt(&mut self) {
        self.transform_attempts += 1;
    }

    pub fn record_render_attempt(&mut self) {
        self.render_attempts += 1;
    }

    pub fn record_validate_attempt(&mut self) {
        self.validate_attempts += 1;
    }

    pub fn record_usage(&mut self, usage: TokenUsage) {
        self.usage.absorb(usage);
    }

    pub fn record_non_fatal(&mut self, message: impl Into<String>) {
        self.non_fatal_errors.push(message.into());
    }

    #[must_use]
    pub const fn transform_attempts(&self) -> u32 {
        self.transform_attempts
    }

    #[must_use]
    pub const fn render_attempts(&self) -> u32 {
        self.render_attempts
    }

    #[must_use]
    pub const fn validate_attempts(&self) -> u32 {
        self.validate_attempts
    }

    #[must_use]
    pub const fn usage(&self) -> TokenUsage {
        self.usage
    }

    #[must_use]
    pub fn non_fatal_errors(&self) -> &[String] {
        &self.non_fatal_errors
    }
}
