//! Deduplication fingerprint over raw file bytes.

use sha2::{Digest, Sha256};

/// Lower-case hex SHA-256 digest of the content.
pub fn content_hash(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
