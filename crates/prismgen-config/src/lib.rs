//! Configuration management for prismgen.
//!
//! Hierarchical discovery with precedence: explicit path > `PRISMGEN_CONFIG`
//! env var > `prismgen.toml` in the working directory > built-in defaults.
//! Supports `[llm.<provider>]`, `[cache]`, and `[engine]` sections.
//!
//! API keys are deliberately NOT part of configuration: callers supply them
//! per request, and the core passes them only to the indicated provider.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default shared retry budget per generation session.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default overall session timeout in seconds.
pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 600;

/// Minimum accepted session timeout in seconds.
pub const MIN_SESSION_TIMEOUT_SECS: u64 = 5;

/// Default cache entry time-to-live in seconds (24 hours).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 86_400;

/// Per-provider LLM settings from `[llm.<provider>]`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Custom API base URL (defaults to the provider's public endpoint).
    pub base_url: Option<String>,
    /// Default model when the request leaves it unspecified.
    pub model: Option<String>,
    /// Default max output tokens.
    pub max_tokens: Option<u32>,
    /// Default sampling temperature.
    pub temperature: Option<f32>,
}

/// `[llm]` section.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Per-invocation timeout in seconds.
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub anthropic: Option<ProviderConfig>,
    #[serde(default)]
    pub openai: Option<ProviderConfig>,
    #[serde(default)]
    pub gemini: Option<ProviderConfig>,
}

impl LlmConfig {
    /// Settings for a provider by its canonical name, if configured.
    #[must_use]
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        match name {
            "anthropic" => self.anthropic.as_ref(),
            "openai" => self.openai.as_ref(),
            "gemini" => self.gemini.as_ref(),
            _ => None,
        }
    }
}

/// `[cache]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Whether the cache is consulted at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Override for the cache directory.
    pub dir: Option<Utf8PathBuf>,
    /// Entry time-to-live in seconds; expired entries are misses.
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

/// `[engine]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Shared retry budget across transform/render/validate per session.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Overall session timeout in seconds; clamped to a sane minimum.
    #[serde(default = "default_session_timeout")]
    pub session_timeout_secs: u64,
    /// Override for the artifact output directory.
    pub output_dir: Option<Utf8PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            session_timeout_secs: DEFAULT_SESSION_TIMEOUT_SECS,
            output_dir: None,
        }
    }
}

impl EngineConfig {
    /// Session timeout with the minimum enforced.
    #[must_use]
    pub fn session_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.session_timeout_secs.max(MIN_SESSION_TIMEOUT_SECS))
    }
}

/// Full configuration model.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Config {
    /// Parse a configuration from TOML text.
    ///
    /// # Errors
    /// Returns an error when the TOML is malformed or has unknown types.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).with_context(|| "Failed to parse configuration TOML")
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Utf8Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&text)
    }

    /// Discover and load configuration.
    ///
    /// Precedence: `explicit` path > `PRISMGEN_CONFIG` > `prismgen.toml` in
    /// the current directory > defaults. A missing file at a discovered
    /// (non-explicit) location falls through to the next source.
    ///
    /// # Errors
    /// Returns an error only when an explicitly named file is missing or any
    /// found file fails to parse.
    pub fn discover(explicit: Option<&Utf8Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        if let Ok(env_path) = std::env::var("PRISMGEN_CONFIG") {
            let path = Utf8PathBuf::from(env_path);
            if path.exists() {
                debug!(path = %path, "Loading configuration from PRISMGEN_CONFIG");
                return Self::load_from(&path);
            }
        }

        let local = Utf8PathBuf::from("prismgen.toml");
        if local.exists() {
            debug!(path = %local, "Loading configuration from working directory");
            return Self::load_from(&local);
        }

        Ok(Self::default())
    }
}

fn default_true() -> bool {
    true
}

fn default_cache_ttl() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_session_timeout() -> u64 {
    DEFAULT_SESSION_TIMEOUT_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.cache.enabled);
        assert_eq!(config.cache.ttl_secs, DEFAULT_CACHE_TTL_SECS);
        assert_eq!(config.engine.max_retries, DEFAULT_MAX_RETRIES);
        assert!(config.llm.anthropic.is_none());
    }

    #[test]
    fn test_parse_provider_sections() {
        let config = Config::from_toml(
            r#"
[llm]
timeout_secs = 120

[llm.anthropic]
model = "claude-sonnet-4-5"
max_tokens = 4096
temperature = 0.2

[cache]
ttl_secs = 3600

[engine]
max_retries = 5
"#,
        )
        .unwrap();

        let anthropic = config.llm.provider("anthropic").unwrap();
        assert_eq!(anthropic.model.as_deref(), Some("claude-sonnet-4-5"));
        assert_eq!(anthropic.max_tokens, Some(4096));
        assert_eq!(config.llm.timeout_secs, Some(120));
        assert_eq!(config.cache.ttl_secs, 3600);
        assert_eq!(config.engine.max_retries, 5);
        assert!(config.llm.provider("gemini").is_none());
    }

    #[test]
    fn test_session_timeout_minimum_enforced() {
        let config = Config::from_toml("[engine]\nsession_timeout_secs = 1\n").unwrap();
        assert_eq!(
            config.engine.session_timeout(),
            std::time::Duration::from_secs(MIN_SESSION_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_malformed_toml_rejected() {
        assert!(Config::from_toml("[llm\nbad").is_err());
    }
}
