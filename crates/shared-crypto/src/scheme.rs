//! # Identity Schemes
//!
//! The handshake and the block seal only ever talk to a `dyn AuthScheme`, so a
//! deployment can switch between the production secp256k1 scheme and the
//! simulated demo scheme without touching protocol code.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{CryptoError, Secp256k1Scheme, SimulatedScheme};

/// Which concrete scheme a deployment uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemeKind {
    /// secp256k1 ECDSA signatures with ECDH key agreement.
    Secp256k1,
    /// Pre-shared-key toy scheme (demo only).
    Simulated,
}

impl SchemeKind {
    /// Canonical lower-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemeKind::Secp256k1 => "secp256k1",
            SchemeKind::Simulated => "simulated",
        }
    }
}

impl fmt::Display for SchemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemeKind {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "secp256k1" => Ok(SchemeKind::Secp256k1),
            "simulated" => Ok(SchemeKind::Simulated),
            other => Err(CryptoError::UnknownScheme(other.to_string())),
        }
    }
}

/// Public verification material of an identity, encoded hex in files.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicIdentity(Vec<u8>);

impl PublicIdentity {
    /// Wrap scheme-specific public key bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Parse from hex.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        hex::decode(s.trim())
            .map(Self)
            .map_err(|e| CryptoError::InvalidInput(format!("public key hex: {e}")))
    }

    /// Hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl TryFrom<String> for PublicIdentity {
    type Error = CryptoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<PublicIdentity> for String {
    fn from(value: PublicIdentity) -> Self {
        value.to_hex()
    }
}

impl fmt::Debug for PublicIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = &self.0[..self.0.len().min(6)];
        write!(f, "PublicIdentity({}..)", hex::encode(shown))
    }
}

/// Long-term 32-byte secret key. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKeyBytes([u8; 32]);

impl SecretKeyBytes {
    /// Wrap raw secret bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw secret bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse a hex key file body.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let mut decoded =
            hex::decode(s.trim()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        if decoded.len() != 32 {
            let actual = decoded.len();
            decoded.zeroize();
            return Err(CryptoError::InvalidKeyLength {
                expected: 32,
                actual,
            });
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();
        Ok(Self(bytes))
    }

    /// Hex encoding, for writing key files.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for SecretKeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKeyBytes(<redacted>)")
    }
}

/// Output of key agreement; input to the session KDF.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; 32]);

impl SharedSecret {
    /// Wrap agreed bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

/// A freshly generated identity.
#[derive(Debug, Clone)]
pub struct IdentityKeyPair {
    /// Secret half, kept by the owner only.
    pub secret: SecretKeyBytes,
    /// Public half, registered out of band.
    pub public: PublicIdentity,
}

/// Capability set every identity scheme provides.
pub trait AuthScheme: Send + Sync + fmt::Debug {
    /// Scheme discriminator.
    fn kind(&self) -> SchemeKind;

    /// Generate a new long-term identity.
    fn generate(&self) -> IdentityKeyPair;

    /// Public identity belonging to `secret`.
    fn public_identity(&self, secret: &SecretKeyBytes) -> Result<PublicIdentity, CryptoError>;

    /// Sign `message` with the long-term secret.
    fn sign(&self, secret: &SecretKeyBytes, message: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Verify `signature` over `message` against a public identity.
    fn verify(
        &self,
        public: &PublicIdentity,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), CryptoError>;

    /// Agree on a secret with `peer`; both sides must obtain identical bytes.
    fn derive_shared_secret(
        &self,
        secret: &SecretKeyBytes,
        peer: &PublicIdentity,
    ) -> Result<SharedSecret, CryptoError>;
}

/// Instantiate the scheme a deployment selected.
pub fn scheme_for(kind: SchemeKind) -> Arc<dyn AuthScheme> {
    match kind {
        SchemeKind::Secp256k1 => Arc::new(Secp256k1Scheme),
        SchemeKind::Simulated => Arc::new(SimulatedScheme),
    }
}
