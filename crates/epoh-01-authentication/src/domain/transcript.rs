//! # Proof Transcripts
//!
//! The exact bytes each party signs, and the session key derivation. Both
//! proofs bind both nonces and the claimed client identity; the distinct role
//! tags stop a Leader proof being reflected back as a client proof.

use shared_crypto::{blake3_derive_key, SessionKey, SharedSecret};
use shared_types::{ClientId, Nonce};
use zeroize::Zeroizing;

/// BLAKE3 derive-key context for session keys.
pub const SESSION_KEY_CONTEXT: &str = "uav-epoh 2024-01 session key";

const LEADER_TAG: &[u8] = b"EPOH-LEADER";
const CLIENT_TAG: &[u8] = b"EPOH-CLIENT";

fn transcript(tag: &[u8], first: &Nonce, second: &Nonce, client_id: &ClientId) -> Vec<u8> {
    let id = client_id.as_str().as_bytes();
    let mut out = Vec::with_capacity(tag.len() + 64 + id.len());
    out.extend_from_slice(tag);
    out.extend_from_slice(first.as_bytes());
    out.extend_from_slice(second.as_bytes());
    out.extend_from_slice(id);
    out
}

/// Message the Leader signs in its challenge: `leader_nonce ‖ client_nonce ‖ id`.
pub fn leader_proof_message(leader_nonce: &Nonce, client_nonce: &Nonce, client_id: &ClientId) -> Vec<u8> {
    transcript(LEADER_TAG, leader_nonce, client_nonce, client_id)
}

/// Message the client signs in its response: `client_nonce ‖ leader_nonce ‖ id`.
pub fn client_proof_message(client_nonce: &Nonce, leader_nonce: &Nonce, client_id: &ClientId) -> Vec<u8> {
    transcript(CLIENT_TAG, client_nonce, leader_nonce, client_id)
}

/// `KDF(client_nonce ‖ leader_nonce ‖ shared_secret)`.
pub fn derive_session_key(client_nonce: &Nonce, leader_nonce: &Nonce, shared: &SharedSecret) -> SessionKey {
    let mut material = Zeroizing::new(Vec::with_capacity(96));
    material.extend_from_slice(client_nonce.as_bytes());
    material.extend_from_slice(leader_nonce.as_bytes());
    material.extend_from_slice(shared.as_bytes());
    SessionKey::from_bytes(blake3_derive_key(SESSION_KEY_CONTEXT, &material))
}
