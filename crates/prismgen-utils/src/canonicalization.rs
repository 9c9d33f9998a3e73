//! Deterministic canonicalization and hashing.
//!
//! Fingerprints and artifact hashes must be stable across platforms and
//! serialization order, so all hashing goes through JCS (RFC 8785) canonical
//! JSON and BLAKE3.

use anyhow::{Context, Result};
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

/// Canonicalization backend identifier recorded alongside fingerprints.
pub const CANONICALIZATION_BACKEND: &str = "jcs-rfc8785";

/// Emit a value as JCS-canonical JSON (RFC 8785).
///
/// JCS guarantees deterministic output regardless of field ordering in the
/// source struct, which makes the result safe to hash.
///
/// # Errors
/// Returns an error if the value cannot be serialized to JSON.
pub fn emit_jcs<T: Serialize>(value: &T) -> Result<String> {
    let json_value =
        serde_json::to_value(value).with_context(|| "Failed to serialize value to JSON")?;
    let json_bytes = serde_json_canonicalizer::to_vec(&json_value)
        .with_context(|| "Failed to canonicalize JSON using JCS")?;
    String::from_utf8(json_bytes).with_context(|| "JCS output contained invalid UTF-8")
}

/// BLAKE3 hash of a byte slice as lowercase hex.
#[must_use]
pub fn blake3_hex(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Hash a serializable value via its JCS-canonical JSON form.
///
/// # Errors
/// Returns an error if canonical serialization fails.
pub fn hash_canonical<T: Serialize>(value: &T) -> Result<String> {
    Ok(blake3_hex(emit_jcs(value)?.as_bytes()))
}

/// Normalize free text for fingerprinting: NFC, LF line endings, trailing
/// whitespace trimmed per line, no trailing blank lines.
///
/// Two pastes of the same logical text (differing only in encoding form or
/// CRLF) must hash identically.
#[must_use]
pub fn normalize_text(content: &str) -> String {
    let nfc: String = content.nfc().collect();
    let mut out: Vec<&str> = nfc.lines().map(str::trim_end).collect();
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Sample {
        b: u32,
        a: &'static str,
    }

    #[test]
    fn test_jcs_orders_keys() {
        let json = emit_jcs(&Sample { b: 2, a: "x" }).unwrap();
        assert_eq!(json, r#"{"a":"x","b":2}"#);
    }

    #[test]
    fn test_hash_is_stable_across_field_order() {
        #[derive(Serialize)]
        struct Reordered {
            a: &'static str,
            b: u32,
        }
        let h1 = hash_canonical(&Sample { b: 2, a: "x" }).unwrap();
        let h2 = hash_canonical(&Reordered { a: "x", b: 2 }).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn test_normalize_text_line_endings() {
        assert_eq!(normalize_text("a\r\nb  \r\n\r\n"), "a\nb");
    }

    #[test]
    fn test_normalize_text_nfc() {
        // "é" composed vs decomposed
        let composed = "caf\u{e9}";
        let decomposed = "cafe\u{301}";
        assert_eq!(normalize_text(composed), normalize_text(decomposed));
    }
}
