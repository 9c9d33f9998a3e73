//! LLM backend abstraction for multi-provider support.
//!
//! All providers implement the [`LlmBackend`] trait, allowing the
//! orchestrators to work with any provider without knowing transport
//! details. Backends are constructed per request with a caller-supplied API
//! key, which is routed to exactly the indicated provider and is neither
//! persisted nor logged.

mod anthropic;
mod gemini;
pub(crate) mod http_client;
mod openai;
mod types;

pub use prismgen_utils::error::LlmError;
pub use types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};

// Test seam; not part of public API stability guarantees.
#[doc(hidden)]
pub use http_client::redact_error_message_for_testing;

pub(crate) use anthropic::AnthropicBackend;
pub(crate) use gemini::GeminiBackend;
pub(crate) use openai::OpenAiBackend;

use prismgen_config::Config;
use prismgen_utils::types::Provider;

/// Default sampling parameters applied when neither the request metadata nor
/// the configuration overrides them.
#[derive(Debug, Clone)]
pub struct HttpParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for HttpParams {
    fn default() -> Self {
        Self {
            max_tokens: 2048,
            temperature: 0.2,
        }
    }
}

/// Resolve model and parameters for an invocation.
///
/// Precedence: invocation model over backend default; `metadata["max_tokens"]`
/// and `metadata["temperature"]` over backend defaults.
pub(crate) fn resolve_params(
    inv: &LlmInvocation,
    default_model: &str,
    default_params: &HttpParams,
) -> (String, HttpParams) {
    let model = if inv.model.is_empty() {
        default_model.to_string()
    } else {
        inv.model.clone()
    };

    let max_tokens = inv
        .metadata
        .get("max_tokens")
        .and_then(|v| v.as_u64())
        .map(|v| v as u32)
        .unwrap_or(default_params.max_tokens);

    let temperature = inv
        .metadata
        .get("temperature")
        .and_then(|v| v.as_f64())
        .map(|v| v as f32)
        .unwrap_or(default_params.temperature);

    (
        model,
        HttpParams {
            max_tokens,
            temperature,
        },
    )
}

/// Construct a backend for the given provider with a per-request API key.
///
/// Configuration supplies base URLs and defaults only; the key comes from the
/// caller and never from config or the environment.
///
/// # Errors
///
/// Returns `LlmError::Misconfiguration` if the key is empty or the backend
/// cannot be constructed.
pub fn for_provider(
    provider: Provider,
    api_key: &str,
    config: &Config,
) -> Result<Box<dyn LlmBackend>, LlmError> {
    if api_key.trim().is_empty() {
        return Err(LlmError::Misconfiguration(format!(
            "Empty API key for provider '{provider}'"
        )));
    }

    let provider_config = config.llm.provider(provider.as_str());
    let base_url = provider_config.and_then(|p| p.base_url.clone());
    let default_model = provider_config
        .and_then(|p| p.model.clone())
        .unwrap_or_default();

    let defaults = HttpParams::default();
    let default_params = HttpParams {
        max_tokens: provider_config
            .and_then(|p| p.max_tokens)
            .unwrap_or(defaults.max_tokens),
        temperature: provider_config
            .and_then(|p| p.temperature)
            .unwrap_or(defaults.temperature),
    };

    match provider {
        Provider::Anthropic => Ok(Box::new(AnthropicBackend::new(
            api_key.to_string(),
            base_url,
            default_model,
            default_params,
        )?)),
        Provider::OpenAi => Ok(Box::new(OpenAiBackend::new(
            api_key.to_string(),
            base_url,
            default_model,
            default_params,
        )?)),
        Provider::Gemini => Ok(Box::new(GeminiBackend::new(
            api_key.to_string(),
            base_url,
            default_model,
            default_params,
        )?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn invocation(model: &str) -> LlmInvocation {
        LlmInvocation::new(
            "sess",
            "transform",
            model,
            Duration::from_secs(30),
            vec![Message::user("hi")],
        )
    }

    #[test]
    fn test_resolve_params_precedence() {
        let defaults = HttpParams {
            max_tokens: 1024,
            temperature: 0.5,
        };

        let inv = invocation("").with_metadata("max_tokens", serde_json::json!(4096));
        let (model, params) = resolve_params(&inv, "fallback-model", &defaults);
        assert_eq!(model, "fallback-model");
        assert_eq!(params.max_tokens, 4096);
        assert!((params.temperature - 0.5).abs() < f32::EPSILON);

        let inv = invocation("explicit-model");
        let (model, params) = resolve_params(&inv, "fallback-model", &defaults);
        assert_eq!(model, "explicit-model");
        assert_eq!(params.max_tokens, 1024);
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let config = Config::default();
        for provider in [Provider::Anthropic, Provider::OpenAi, Provider::Gemini] {
            let result = for_provider(provider, "  ", &config);
            assert!(matches!(result, Err(LlmError::Misconfiguration(_))));
        }
    }

    #[test]
    fn test_for_provider_constructs_each_backend() {
        let config = Config::default();
        for provider in [Provider::Anthropic, Provider::OpenAi, Provider::Gemini] {
            assert!(for_provider(provider, "test-key", &config).is_ok());
        }
    }
}
