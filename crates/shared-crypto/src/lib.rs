//! # Shared Crypto - Cryptographic Primitives for UAV-EPOH
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256, BLAKE3 | Block hashes, session key derivation |
//! | `mac` | HMAC-SHA256 | Submission authentication under a session key |
//! | `scheme` | trait `AuthScheme` | Sign / verify / key agreement, selected per deployment |
//! | `ecdsa` | secp256k1 ECDSA + ECDH | Production identity scheme |
//! | `simulated` | HMAC over pre-shared keys | Demo scheme over pre-shared keys |
//!
//! ## Security Properties
//!
//! - **secp256k1**: RFC 6979 deterministic nonces, ECDH shared secret
//! - **Session keys**: zeroized on drop, compared in constant time
//! - **Simulated scheme**: NOT secure, public identity equals the secret

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;
pub mod mac;
pub mod scheme;
pub mod simulated;

// Re-exports
pub use ecdsa::Secp256k1Scheme;
pub use errors::CryptoError;
pub use hashing::{blake3_derive_key, sha256, sha256_many};
pub use mac::{hmac_sha256, SessionKey, MAC_LEN};
pub use scheme::{
    scheme_for, AuthScheme, IdentityKeyPair, PublicIdentity, SchemeKind, SecretKeyBytes,
    SharedSecret,
};
pub use simulated::SimulatedScheme;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
