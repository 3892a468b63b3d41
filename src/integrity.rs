//! Validates artifact integrity using SHA-256 checksums
//!
//! The training job writes `model.json` and, optionally, `model.json.sha256`
//! next to it. A digest can also be pinned through configuration. When either
//! is present, the bytes read at startup must hash to it or the artifact is
//! rejected before it is parsed.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::errors::ArtifactLoadError;

/// Computes the hex-encoded SHA-256 digest of `bytes`.
pub fn compute_checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Path of the sidecar digest file for an artifact (`<path>.sha256`).
pub fn sidecar_path(artifact_path: &Path) -> PathBuf {
    let mut name = artifact_path.as_os_str().to_owned();
    name.push(".sha256");
    PathBuf::from(name)
}

/// Reads the expected digest from a sidecar file, if one exists.
///
/// Accepts both a bare digest and the `sha256sum` output format
/// (`<digest>  <filename>`).
pub fn read_sidecar(artifact_path: &Path) -> Option<String> {
    let contents = std::fs::read_to_string(sidecar_path(artifact_path)).ok()?;
    contents
        .split_whitespace()
        .next()
        .map(|digest| digest.to_ascii_lowercase())
}

/// Checks `bytes` against an expected digest.
///
/// Returns the computed digest so callers can report it.
pub fn verify(bytes: &[u8], expected: &str) -> Result<String, ArtifactLoadError> {
    let actual = compute_checksum(bytes);
    let expected = expected.trim().to_ascii_lowercase();

    if actual == expected {
        Ok(actual)
    } else {
        tracing::warn!(
            "Artifact validation failed: checksum mismatch. Expected: {}, Data length: {}",
            expected,
            bytes.len()
        );
        Err(ArtifactLoadError::ChecksumMismatch { expected, actual })
    }
}
