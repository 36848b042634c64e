//! Payload encoding and condition hashing.

use l2cache_core::{L2Error, L2Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Encode a payload for storage.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(value)
}

/// Decode a stored payload.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> serde_json::Result<T> {
    serde_json::from_slice(bytes)
}

/// Render a query condition as a stable string.
///
/// Struct fields serialize in declaration order and `serde_json::Value`
/// objects in key order, so equal conditions always render identically.
pub fn canonicalize<C: Serialize + ?Sized>(condition: &C) -> L2Result<String> {
    serde_json::to_string(condition)
        .map_err(|e| L2Error::persistence(format!("Failed to encode query condition: {}", e)))
}

/// Hex-encoded SHA-256 of `input`.
#[must_use]
pub fn digest(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
