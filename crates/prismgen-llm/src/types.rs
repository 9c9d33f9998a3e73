//! Core types for the LLM backend abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use prismgen_utils::error::LlmError;
use prismgen_utils::types::TokenUsage;

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instructions.
    System,
    /// User input.
    User,
    /// Assistant response.
    Assistant,
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender.
    pub role: Role,
    /// Plain UTF-8 text content.
    pub content: String,
}

impl Message {
    /// Create a new message.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Input to an LLM backend invocation.
#[derive(Debug, Clone)]
pub struct LlmInvocation {
    /// Session this call belongs to, for log correlation only.
    pub session_id: String,
    /// What the call is for (e.g. "transform", "first_question").
    pub purpose: String,
    /// Model to use; empty string falls back to the backend default.
    pub model: String,
    /// Timeout for this invocation.
    pub timeout: Duration,
    /// Ordered conversation messages.
    pub messages: Vec<Message>,
    /// Provider-tunable parameters (`max_tokens`, `temperature`).
    pub metadata: HashMap<String, serde_json::Value>,
}

impl LlmInvocation {
    /// Create a new invocation.
    #[must_use]
    pub fn new(
        session_id: impl Into<String>,
        purpose: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
        messages: Vec<Message>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            purpose: purpose.into(),
            model: model.into(),
            timeout,
            messages,
            metadata: HashMap::new(),
        }
    }

    /// Add a tunable parameter.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Result of an LLM backend invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResult {
    /// Raw response text from the model.
    pub raw_response: String,
    /// Provider name that served the call.
    pub provider: String,
    /// Model that was actually used.
    pub model_used: String,
    /// Token counts, when the provider reports them.
    pub usage: Option<TokenUsage>,
}

impl LlmResult {
    /// Create a new result.
    #[must_use]
    pub fn new(
        raw_response: impl Into<String>,
        provider: impl Into<String>,
        model_used: impl Into<String>,
    ) -> Self {
        Self {
            raw_response: raw_response.into(),
            provider: provider.into(),
            model_used: model_used.into(),
            usage: None,
        }
    }

    /// Attach token counts.
    #[must_use]
    pub fn with_usage(mut self, input: u64, output: u64) -> Self {
        self.usage = Some(TokenUsage {
            tokens_input: input,
            tokens_output: output,
        });
        self
    }
}

/// Trait for LLM backend implementations.
///
/// All providers implement this trait, allowing the orchestrators to work
/// with any provider without knowing transport details.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Invoke the model with the given conversation.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] for any failure: transport errors, provider
    /// errors (auth, quota, outages), and timeouts.
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError>;
}
