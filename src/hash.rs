use sha2::{Digest, Sha256};

use crate::constants::redaction::DIGEST_HEX_LEN;

/// One-way, fixed-length digest used to redact sensitive values.
///
/// Lowercase hex of SHA-256, truncated to `DIGEST_HEX_LEN` characters.
pub fn redaction_digest(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(DIGEST_HEX_LEN);
    hex
}
