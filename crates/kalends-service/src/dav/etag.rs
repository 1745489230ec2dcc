//! `ETag` generation.

use sha2::{Digest, Sha256};

/// ## Summary
/// Lowercase hex SHA-256 of the raw payload.
#[must_use]
pub fn generate_etag(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

/// Payload length as stored in the `size` column.
#[must_use]
pub fn payload_size(payload: &[u8]) -> i64 {
    i64::try_from(payload.len()).unwrap_or(i64::MAX)
}
