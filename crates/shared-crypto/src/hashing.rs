//! # Hashing
//!
//! SHA-256 for everything that ends up on the ledger, BLAKE3 in
//! key-derivation mode for session keys.

use sha2::{Digest, Sha256};

/// 256-bit digest.
pub type Hash = [u8; 32];

/// Hash data with SHA-256 (one-shot).
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// Hash the concatenation of multiple inputs.
pub fn sha256_many(inputs: &[&[u8]]) -> Hash {
    let mut hasher = Sha256::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize().into()
}

/// Derive key from context and input key material.
///
/// `context` must be a hardcoded, globally unique string.
pub fn blake3_derive_key(context: &str, key_material: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(key_material);
    *hasher.finalize().as_bytes()
}
