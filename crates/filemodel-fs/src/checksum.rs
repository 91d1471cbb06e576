//! SHA-256 checksum utilities
//!
//! Provides a single canonical checksum format (`sha256:<hex>`) used by the
//! model cache to detect whether a file's content changed since it was loaded.

use sha2::{Digest, Sha256};
use std::path::Path;

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

/// Compute the SHA-256 checksum of string content.
///
/// Returns a string in the canonical format `"sha256:<hex>"`.
pub fn compute_content_checksum(content: &str) -> String {
    compute_bytes_checksum(content.as_bytes())
}

/// Compute the SHA-256 checksum of raw bytes.
pub fn compute_bytes_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// Compute the SHA-256 checksum of a file's contents.
///
/// Returns a string in the canonical format `"sha256:<hex>"`.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn compute_file_checksum(path: &Path) -> std::io::Result<String> {
    let content = std::fs::read(path)?;
    Ok(compute_bytes_checksum(&content))
}

/// Source of content hashes used for change detection.
///
/// Only content is hashed; timestamps never participate, so a copy or
/// restore that keeps the bytes intact is not reported as a change.
pub trait ChecksumSource {
    /// Hash the file at `path`, or `None` when it cannot be read.
    fn checksum(&self, path: &Path) -> Option<String>;
}

/// [`ChecksumSource`] backed by SHA-256 over the full file content.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Checksum;

impl ChecksumSource for Sha256Checksum {
    fn checksum(&self, path: &Path) -> Option<String> {
        match compute_file_checksum(path) {
            Ok(checksum) => Some(checksum),
            Err(e) => {
                tracing::trace!(path = %path.display(), error = %e, "No checksum available");
                None
            }
        }
    }
}
