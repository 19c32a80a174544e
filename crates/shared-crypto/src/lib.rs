//! # Shared Crypto - Client Cryptographic Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `signatures` | Ed25519 | Certificate keys, invocation proofs, envelope signatures |
//! | `hashing` | SHA-256, SHA3-256, BLAKE3 | Bindings, program names, key derivation |
//! | `symmetric` | XChaCha20-Poly1305 | Confidential transaction payloads |
//!
//! ## Security Properties
//!
//! - **Ed25519**: Deterministic nonces, no RNG dependency when signing
//! - **XChaCha20**: 192-bit random nonce per payload, constant-time
//! - **BLAKE3 derive_key**: Domain-separated derivation of one-time keys

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod signatures;
pub mod symmetric;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{derive_key, sha256, sha256_many, sha3_256, Hash};
pub use signatures::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
pub use symmetric::{open, seal, Nonce, SecretKey};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
