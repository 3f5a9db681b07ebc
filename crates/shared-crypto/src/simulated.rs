//! Simulated identity scheme for demos and tests.
//!
//! Every identity is a pre-shared 32-byte key: the "public" identity is the
//! key itself, so anyone holding the keyring can impersonate anyone. Never
//! deploy with this scheme.

use subtle::ConstantTimeEq;

use crate::hashing::sha256_many;
use crate::mac::hmac_sha256;
use crate::scheme::{
    AuthScheme, IdentityKeyPair, PublicIdentity, SchemeKind, SecretKeyBytes, SharedSecret,
};
use crate::CryptoError;

const SIGN_TAG: &[u8] = b"EPOH-SIM-SIG";
const AGREE_TAG: &[u8] = b"EPOH-SIM-AGREE";

/// Pre-shared-key scheme.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedScheme;

fn key_from_public(public: &PublicIdentity) -> Result<&[u8], CryptoError> {
    let bytes = public.as_bytes();
    if bytes.len() != 32 {
        return Err(CryptoError::InvalidPublicKey);
    }
    Ok(bytes)
}

fn tagged(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(SIGN_TAG.len() + message.len());
    out.extend_from_slice(SIGN_TAG);
    out.extend_from_slice(message);
    out
}

impl AuthScheme for SimulatedScheme {
    fn kind(&self) -> SchemeKind {
        SchemeKind::Simulated
    }

    fn generate(&self) -> IdentityKeyPair {
        let bytes: [u8; 32] = rand::random();
        IdentityKeyPair {
            secret: SecretKeyBytes::from_bytes(bytes),
            public: PublicIdentity::from_bytes(bytes.to_vec()),
        }
    }

    fn public_identity(&self, secret: &SecretKeyBytes) -> Result<PublicIdentity, CryptoError> {
        Ok(PublicIdentity::from_bytes(secret.as_bytes().to_vec()))
    }

    fn sign(&self, secret: &SecretKeyBytes, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Ok(hmac_sha256(secret.as_bytes(), &tagged(message)).to_vec())
    }

    fn verify(
        &self,
        public: &PublicIdentity,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), CryptoError> {
        let key = key_from_public(public)?;
        if signature.len() != 32 {
            return Err(CryptoError::InvalidSignatureFormat);
        }
        let expected = hmac_sha256(key, &tagged(message));
        if bool::from(expected.ct_eq(signature)) {
            Ok(())
        } else {
            Err(CryptoError::SignatureVerificationFailed)
        }
    }

    fn derive_shared_secret(
        &self,
        secret: &SecretKeyBytes,
        peer: &PublicIdentity,
    ) -> Result<SharedSecret, CryptoError> {
        let ours: &[u8] = secret.as_bytes();
        let theirs = key_from_public(peer)?;
        let (lo, hi) = if ours <= theirs {
            (ours, theirs)
        } else {
            (theirs, ours)
        };
        Ok(SharedSecret::from_bytes(sha256_many(&[AGREE_TAG, lo, hi])))
    }
}
