//! # secp256k1 Identity Scheme
//!
//! ECDSA signatures (RFC 6979 deterministic nonces, 64-byte `r||s`) and ECDH
//! key agreement over secp256k1. Public identities are SEC1 compressed points
//! (33 bytes).

use k256::ecdsa::{
    signature::{Signer, Verifier},
    Signature, SigningKey, VerifyingKey,
};
use k256::{ecdh, PublicKey, SecretKey};

use crate::scheme::{
    AuthScheme, IdentityKeyPair, PublicIdentity, SchemeKind, SecretKeyBytes, SharedSecret,
};
use crate::CryptoError;

/// Production identity scheme.
#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1Scheme;

fn signing_key(secret: &SecretKeyBytes) -> Result<SigningKey, CryptoError> {
    SigningKey::from_slice(secret.as_bytes()).map_err(|_| CryptoError::InvalidPrivateKey)
}

impl AuthScheme for Secp256k1Scheme {
    fn kind(&self) -> SchemeKind {
        SchemeKind::Secp256k1
    }

    fn generate(&self) -> IdentityKeyPair {
        let key = SigningKey::random(&mut rand::thread_rng());
        let secret = SecretKeyBytes::from_bytes(key.to_bytes().into());
        let public = PublicIdentity::from_bytes(key.verifying_key().to_sec1_bytes().to_vec());
        IdentityKeyPair { secret, public }
    }

    fn public_identity(&self, secret: &SecretKeyBytes) -> Result<PublicIdentity, CryptoError> {
        let key = signing_key(secret)?;
        Ok(PublicIdentity::from_bytes(
            key.verifying_key().to_sec1_bytes().to_vec(),
        ))
    }

    fn sign(&self, secret: &SecretKeyBytes, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let key = signing_key(secret)?;
        let sig: Signature = key.sign(message);
        Ok(sig.to_bytes().to_vec())
    }

    fn verify(
        &self,
        public: &PublicIdentity,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), CryptoError> {
        let verifying_key = VerifyingKey::from_sec1_bytes(public.as_bytes())
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        let sig = Signature::from_slice(signature).map_err(|_| CryptoError::InvalidSignatureFormat)?;

        verifying_key
            .verify(message, &sig)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }

    fn derive_shared_secret(
        &self,
        secret: &SecretKeyBytes,
        peer: &PublicIdentity,
    ) -> Result<SharedSecret, CryptoError> {
        let ours =
            SecretKey::from_slice(secret.as_bytes()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        let theirs =
            PublicKey::from_sec1_bytes(peer.as_bytes()).map_err(|_| CryptoError::InvalidPublicKey)?;

        let shared = ecdh::diffie_hellman(ours.to_nonzero_scalar(), theirs.as_affine());
        let bytes: [u8; 32] = (*shared.raw_secret_bytes()).into();
        Ok(SharedSecret::from_bytes(bytes))
    }
}
