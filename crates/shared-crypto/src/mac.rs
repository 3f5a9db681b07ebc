//! # Session MAC
//!
//! HMAC-SHA256 keyed with the per-session key agreed during the handshake.
//! Verification is constant-time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::CryptoError;

type HmacSha256 = Hmac<Sha256>;

/// Length of a session MAC tag in bytes.
pub const MAC_LEN: usize = 32;

/// Compute HMAC-SHA256 of `data` under `key`.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; MAC_LEN] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/// Ephemeral symmetric key shared by one client and the Leader.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; 32]);

impl SessionKey {
    /// Wrap derived key bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// MAC `data` under this key.
    pub fn mac(&self, data: &[u8]) -> [u8; MAC_LEN] {
        hmac_sha256(&self.0, data)
    }

    /// Check a MAC tag in constant time.
    pub fn verify(&self, data: &[u8], tag: &[u8]) -> Result<(), CryptoError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.0).map_err(|_| CryptoError::InvalidKeyLength {
                expected: 32,
                actual: self.0.len(),
            })?;
        mac.update(data);
        mac.verify_slice(tag).map_err(|_| CryptoError::MacMismatch)
    }
}

impl PartialEq for SessionKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for SessionKey {}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(<redacted>)")
    }
}
