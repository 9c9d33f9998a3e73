//! Atomic file writes via temp file + fsync + rename.
//!
//! Cache entries and artifacts must never be observable half-written: a
//! reader either sees the previous state or the complete new file.

use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

/// Atomically write bytes to `path`.
///
/// Writes to a temporary file in the target's directory, fsyncs, then
/// renames over the destination. The temp file is created in the same
/// directory so the rename stays on one filesystem.
///
/// # Errors
/// Returns an error if the parent directory cannot be created or any I/O
/// step fails; the destination is left untouched on failure.
pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create parent directory: {parent}"))?;
    }

    let temp_dir = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    let mut temp_file = NamedTempFile::new_in(temp_dir)
        .with_context(|| format!("Failed to create temporary file in: {temp_dir}"))?;

    temp_file
        .write_all(content)
        .with_context(|| "Failed to write content to temporary file")?;
    temp_file
        .as_file()
        .sync_all()
        .with_context(|| "Failed to fsync temporary file")?;

    temp_file
        .persist(path.as_std_path())
        .with_context(|| format!("Failed to rename temporary file into place at: {path}"))?;

    Ok(())
}

/// Atomically write a UTF-8 string, normalizing line endings to LF.
///
/// # Errors
/// See [`write_bytes_atomic`].
pub fn write_file_atomic(path: &Utf8Path, content: &str) -> Result<()> {
    let normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    write_bytes_atomic(path, normalized.as_bytes())
}
