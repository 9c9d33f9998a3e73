//! Property-based tests for fingerprint determinism and option
//! sensitivity at the public request level.

use proptest::prelude::*;

use prismgen::{
    CachePolicy, Fingerprint, GenerationPreferences, GenerationRequest, OutputKind, Provider,
    SourceItem,
};

fn request(content: String, model: String, temperature: f32) -> GenerationRequest {
    GenerationRequest {
        sources: vec![SourceItem::Text { content }],
        output_kind: OutputKind::Pdf,
        provider: Provider::Anthropic,
        model,
        image_model: None,
        cache: CachePolicy::default(),
        preferences: GenerationPreferences {
            temperature,
            ..Default::default()
        },
    }
}

proptest! {
    /// Same logical request, same hash, always.
    #[test]
    fn fingerprint_deterministic(content in ".*", model in "[a-z0-9-]{1,30}") {
        let a = Fingerprint::compute(&request(content.clone(), model.clone(), 0.7).canonical()).unwrap();
        let b = Fingerprint::compute(&request(content, model, 0.7).canonical()).unwrap();
        prop_assert_eq!(a, b);
    }

    /// CRLF/LF and trailing-whitespace variants of pasted text are the
    /// same logical request.
    #[test]
    fn fingerprint_ignores_line_ending_encoding(lines in proptest::collection::vec("[a-zA-Z0-9 ]{0,20}", 1..10)) {
        let lf = lines.join("\n");
        let crlf = lines.iter().map(|l| format!("{l}  ")).collect::<Vec<_>>().join("\r\n");
        let a = Fingerprint::compute(&request(lf, "m".into(), 0.7).canonical()).unwrap();
        let b = Fingerprint::compute(&request(crlf, "m".into(), 0.7).canonical()).unwrap();
        prop_assert_eq!(a, b);
    }

    /// Any model change changes the hash.
    #[test]
    fn fingerprint_sensitive_to_model(model_a in "[a-z]{1,20}", model_b in "[A-Z]{1,20}") {
        let a = Fingerprint::compute(&request("x".into(), model_a, 0.7).canonical()).unwrap();
        let b = Fingerprint::compute(&request("x".into(), model_b, 0.7).canonical()).unwrap();
        prop_assert_ne!(a, b);
    }

    /// Cache policy never affects the hash.
    #[test]
    fn fingerprint_ignores_cache_policy(content in "[a-z]{1,40}") {
        let mut with = request(content.clone(), "m".into(), 0.7);
        with.cache = CachePolicy { reuse: true };
        let mut without = request(content, "m".into(), 0.7);
        without.cache = CachePolicy { reuse: false };
        prop_assert_eq!(
            Fingerprint::compute(&with.canonical()).unwrap(),
            Fingerprint::compute(&without.canonical()).unwrap()
        );
    }

    /// Distinguishable temperatures split the hash; identical ones do not.
    #[test]
    fn fingerprint_temperature_millesimal(t in 0u32..=1000) {
        let a = Fingerprint::compute(&request("x".into(), "m".into(), t as f32 / 1000.0).canonical()).unwrap();
        let b = Fingerprint::compute(&request("x".into(), "m".into(), t as f32 / 1000.0).canonical()).unwrap();
        prop_assert_eq!(a, b);
    }
}

#[test]
fn fingerprint_is_64_hex() {
    let fp = Fingerprint::compute(&request("x".into(), "m".into(), 0.7).canonical()).unwrap();
    assert_eq!(fp.as_str().len(), 64);
    assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
}
