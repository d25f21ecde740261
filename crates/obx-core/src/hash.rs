//! Stable content hashing over canonical JSON.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::errors::ObxError;
use crate::serde::to_canonical_json_bytes;

/// Computes a stable hexadecimal hash for the provided serializable payload.
///
/// The payload is first rendered to canonical JSON so the digest is identical
/// across platforms and serializer versions for structurally equal values.
pub fn stable_hash_string<T: Serialize>(value: &T) -> Result<String, ObxError> {
    let bytes = to_canonical_json_bytes(value)?;
    let digest = Sha256::digest(bytes);
    Ok(format!("{:x}", digest))
}
