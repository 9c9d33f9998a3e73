//! Filesystem layout for cache entries and generated artifacts.

use camino::Utf8PathBuf;

/// Root data directory: `$PRISMGEN_HOME`, else the platform data dir,
/// else `.prismgen` under the current directory.
#[must_use]
pub fn prismgen_home() -> Utf8PathBuf {
    if let Ok(home) = std::env::var("PRISMGEN_HOME") {
        return Utf8PathBuf::from(home);
    }

    dirs::data_dir()
        .and_then(|d| Utf8PathBuf::from_path_buf(d.join("prismgen")).ok())
        .unwrap_or_else(|| Utf8PathBuf::from(".prismgen"))
}

/// Directory holding cache entry files (`<fingerprint>.json`).
#[must_use]
pub fn cache_dir() -> Utf8PathBuf {
    prismgen_home().join("cache")
}

/// Directory holding generated artifacts.
#[must_use]
pub fn output_dir() -> Utf8PathBuf {
    prismgen_home().join("generated")
}

/// Create a directory and parents, tolerating concurrent creation.
///
/// # Errors
/// Propagates any error other than `AlreadyExists`.
pub fn ensure_dir_all(path: &camino::Utf8Path) -> std::io::Result<()> {
    match std::fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}
