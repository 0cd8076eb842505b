//! SHA256 digest utilities for manifest references
//!
//! Registries report a manifest's digest in `Docker-Content-Digest`; when they
//! don't, the digest is the sha256 of the exact manifest bytes served.

use crate::error::{Result, WorkbenchError};
use sha2::{Digest, Sha256};

/// Utilities for working with content digests
pub struct DigestUtils;

impl DigestUtils {
    /// Compute SHA256 digest from byte data
    pub fn compute_sha256(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    /// Compute full digest (with sha256: prefix) from byte data
    pub fn compute_docker_digest(data: &[u8]) -> String {
        format!("sha256:{}", Self::compute_sha256(data))
    }

    /// Validate SHA256 hex string (64 characters, all hex)
    pub fn is_valid_sha256_hex(digest: &str) -> bool {
        digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Validate full digest format (sha256:xxxxx)
    pub fn is_valid_docker_digest(digest: &str) -> bool {
        digest
            .strip_prefix("sha256:")
            .is_some_and(Self::is_valid_sha256_hex)
    }

    /// Normalize digest to full format (add sha256: prefix if missing)
    pub fn normalize_digest(digest: &str) -> Result<String> {
        let hex_part = digest.strip_prefix("sha256:").unwrap_or(digest);
        if !Self::is_valid_sha256_hex(hex_part) {
            return Err(WorkbenchError::Validation(format!(
                "Invalid SHA256 digest: expected 64 hex characters, got '{}'",
                digest
            )));
        }
        Ok(format!("sha256:{}", hex_part.to_ascii_lowercase()))
    }
}
