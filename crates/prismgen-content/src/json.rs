//! Recovery of JSON payloads from model output.
//!
//! Models asked for "only JSON" still wrap it in markdown fences or lead
//! with prose. Recovery order: strip fences, try a straight parse, then
//! scan for the first balanced `{...}` object.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Opening fence with optional language tag.
static OPEN_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^```[A-Za-z]*\s*\n?").unwrap());

/// Strip a surrounding markdown code fence, if present.
#[must_use]
pub fn strip_markdown_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(m) = OPEN_FENCE.find(trimmed) else {
        return trimmed;
    };
    let inner = &trimmed[m.end()..];
    inner.strip_suffix("```").map_or(inner, str::trim_end).trim()
}

/// Extract the first balanced JSON object from free text.
///
/// Brace-balance scan that respects string literals and escapes. Returns
/// the slice spanning the first complete object, or `None`.
#[must_use]
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse a typed value out of raw model output.
///
/// Tries, in order: fence-stripped direct parse, then balanced-object
/// extraction. Returns the serde error of the direct parse when neither
/// succeeds, so callers see the most informative message.
///
/// # Errors
/// Returns a `serde_json::Error` when no parseable object is found.
pub fn parse_model_json<T: DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    let stripped = strip_markdown_fences(raw);

    match serde_json::from_str::<T>(stripped) {
        Ok(value) => Ok(value),
        Err(direct_err) => {
            if let Some(object) = extract_json_object(stripped)
                && let Ok(value) = serde_json::from_str::<T>(object)
            {
                debug!("Recovered JSON object from surrounding prose");
                return Ok(value);
            }
            Err(direct_err)
        }
    }
}
