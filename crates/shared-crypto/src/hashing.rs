//! # Digests and Key Derivation
//!
//! - SHA-256 for transaction bindings
//! - SHA3-256 for content-addressed program names
//! - BLAKE3 `derive_key` for one-time certificate keys

use sha2::{Digest, Sha256};
use sha3::Sha3_256;

/// 256-bit digest output.
pub type Hash = [u8; 32];

/// SHA-256 of one input.
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// SHA-256 over the concatenation of several inputs.
pub fn sha256_many(inputs: &[&[u8]]) -> Hash {
    let mut hasher = Sha256::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize().into()
}

/// SHA3-256 over the concatenation of several inputs.
pub fn sha3_256(inputs: &[&[u8]]) -> Hash {
    let mut hasher = Sha3_256::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize().into()
}

/// Derive a 32-byte key from a context string and key material.
pub fn derive_key(context: &str, key_material: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(key_material);
    *hasher.finalize().as_bytes()
}
