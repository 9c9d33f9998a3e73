//! Shared infrastructure for the prismgen workspace
//!
//! Cross-crate types (output kinds, providers, pipeline stages), the error
//! taxonomy with stable client-facing codes, canonical JSON hashing, atomic
//! file writes, and tracing initialization.

pub mod atomic_write;
pub mod canonicalization;
pub mod error;
pub mod logging;
pub mod paths;
pub mod types;
