//! Generation request model.

use serde::{Deserialize, Serialize};

use prismgen_cache::{CanonicalRequest, CanonicalSource};
use prismgen_extraction::SourceItem;
use prismgen_utils::types::{Audience, OutputKind, Provider};

/// Cache behavior for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    /// Reuse an existing cache entry when the fingerprint matches. When
    /// false the build always runs and its result supersedes any previous
    /// entry for the fingerprint.
    pub reuse: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self { reuse: true }
    }
}

/// Options that shape generated content. Every field participates in the
/// request fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationPreferences {
    #[serde(default)]
    pub audience: Audience,
    /// Sampling temperature for the transformation call.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Max output tokens for the transformation call.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Upper bound on slides for deck outputs.
    #[serde(default = "default_max_slides")]
    pub max_slides: u32,
    /// Upper bound on sections/summary points for document outputs.
    #[serde(default = "default_max_summary_points")]
    pub max_summary_points: u32,
}

impl Default for GenerationPreferences {
    fn default() -> Self {
        Self {
            audience: Audience::default(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_slides: default_max_slides(),
            max_summary_points: default_max_summary_points(),
        }
    }
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_max_slides() -> u32 {
    15
}

fn default_max_summary_points() -> u32 {
    8
}

/// A generation request. Immutable once accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Ordered source items.
    pub sources: Vec<SourceItem>,
    pub output_kind: OutputKind,
    pub provider: Provider,
    /// Model identifier; empty string falls back to the configured default.
    pub model: String,
    /// Image-model identifier, when image generation applies downstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_model: Option<String>,
    #[serde(default)]
    pub cache: CachePolicy,
    #[serde(default)]
    pub preferences: GenerationPreferences,
}

impl GenerationRequest {
    /// Build the canonical form used for fingerprinting.
    ///
    /// Cache policy is deliberately excluded: it selects behavior, not
    /// content. Temperature is carried with millesimal precision so float
    /// formatting can never split identical requests.
    #[must_use]
    pub fn canonical(&self) -> CanonicalRequest {
        CanonicalRequest {
            sources: self.sources.iter().map(CanonicalSource::from_item).collect(),
            output_kind: self.output_kind.as_str().to_string(),
            provider: self.provider.as_str().to_string(),
            model: self.model.clone(),
            image_model: self.image_model.clone(),
            audience: self.preferences.audience.as_str().to_string(),
            temperature_milli: (f64::from(self.preferences.temperature) * 1000.0).round() as u32,
            max_tokens: self.preferences.max_tokens,
            max_slides: self.preferences.max_slides,
            max_summary_points: self.preferences.max_summary_points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prismgen_cache::Fingerprint;

    fn request(reuse: bool) -> GenerationRequest {
        GenerationRequest {
            sources: vec![SourceItem::Text {
                content: "material".into(),
            }],
            output_kind: OutputKind::Pdf,
            provider: Provider::Anthropic,
            model: "claude-sonnet-4-5".into(),
            image_model: None,
            cache: CachePolicy { reuse },
            preferences: GenerationPreferences::default(),
        }
    }

    #[test]
    fn test_cache_policy_excluded_from_fingerprint() {
        let with_reuse = Fingerprint::compute(&request(true).canonical()).unwrap();
        let without_reuse = Fingerprint::compute(&request(false).canonical()).unwrap();
        assert_eq!(with_reuse, without_reuse);
    }

    #[test]
    fn test_temperature_precision_is_stable() {
        let mut a = request(true);
        a.preferences.temperature = 0.7;
        let mut b = request(true);
        b.preferences.temperature = 0.7000001;
        assert_eq!(a.canonical().temperature_milli, b.canonical().temperature_milli);
    }

    #[test]
    fn test_request_round_trips_through_serde() {
        let original = request(true);
        let json = serde_json::to_string(&original).unwrap();
        let back: GenerationRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, original);
    }
}
