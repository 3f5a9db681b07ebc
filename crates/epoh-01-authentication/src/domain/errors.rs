//! # Authentication Errors

use std::path::PathBuf;

use shared_crypto::CryptoError;
use shared_types::ClientId;
use thiserror::Error;

use crate::ports::outbound::TransportError;

/// Reasons a handshake did not produce a session.
///
/// All of these are recovered locally: the Leader refuses the session and the
/// client's caller decides whether to retry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// `client_id` has no registered public identity.
    #[error("Unknown client: {0}")]
    UnknownClient(ClientId),

    /// The Leader's challenge proof did not verify against its known identity.
    #[error("Leader proof did not verify")]
    LeaderUnverified,

    /// The client's response proof did not verify against its registered identity.
    #[error("Client proof did not verify for {0}")]
    ClientUnverified(ClientId),

    /// The client nonce was already used by this client inside the replay window.
    #[error("Replayed client nonce from {0}")]
    ReplayDetected(ClientId),

    /// The client's replay-guard slot is full of unexpired nonces.
    #[error("Too many recent handshakes for {0}")]
    Busy(ClientId),

    /// A round trip exceeded the handshake timeout.
    #[error("Handshake round trip timed out")]
    Timeout,

    /// The peer refused the handshake.
    #[error("Handshake rejected by peer: {0}")]
    Rejected(String),

    /// The channel failed underneath the handshake.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The peer sent a frame that does not belong at this step.
    #[error("Protocol violation: {0}")]
    Protocol(String),

    /// Key material could not be used.
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl AuthError {
    /// Stable label for metrics and refusal frames.
    pub fn label(&self) -> &'static str {
        match self {
            AuthError::UnknownClient(_) => "unknown_client",
            AuthError::LeaderUnverified => "leader_unverified",
            AuthError::ClientUnverified(_) => "client_unverified",
            AuthError::ReplayDetected(_) => "replay_detected",
            AuthError::Busy(_) => "busy",
            AuthError::Timeout => "timeout",
            AuthError::Rejected(_) => "rejected",
            AuthError::Transport(_) => "transport",
            AuthError::Protocol(_) => "protocol",
            AuthError::Crypto(_) => "crypto",
        }
    }
}

/// Errors loading or saving trust bootstrap material.
#[derive(Debug, Error)]
pub enum KeyringError {
    /// File could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The keyring document is not valid JSON of the expected shape.
    #[error("Malformed keyring: {0}")]
    Parse(String),

    /// The same identity appears twice.
    #[error("Duplicate identity in keyring: {0}")]
    DuplicateIdentity(ClientId),

    /// A key could not be decoded.
    #[error("Invalid key for {id}: {reason}")]
    InvalidKey { id: String, reason: String },
}
