//! # Domain Entities

use std::time::Duration;

use serde::{Deserialize, Serialize};
use shared_crypto::SessionKey;
use shared_types::ClientId;

/// Default session lifetime.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(3600);

/// Default payload size limit (64 KiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 64 * 1024;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Leader identity; author of genesis and of audit blocks' seals.
    pub leader_id: ClientId,
    /// Lifetime of a session from establishment.
    pub session_ttl: Duration,
    /// Largest accepted telemetry payload.
    pub max_payload_bytes: usize,
}

impl LedgerConfig {
    /// Defaults for a given Leader identity.
    pub fn new(leader_id: ClientId) -> Self {
        Self {
            leader_id,
            session_ttl: DEFAULT_SESSION_TTL,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

/// Ephemeral state created by a successful handshake.
///
/// Owned by the engine, never persisted: a Leader restart forces every client
/// to re-authenticate.
#[derive(Debug, Clone)]
pub struct Session {
    pub client_id: ClientId,
    pub session_key: SessionKey,
    pub established_at_micros: u64,
    pub expires_at_micros: u64,
}

impl Session {
    /// Whether the session is still live at `now`.
    pub fn is_live(&self, now_micros: u64) -> bool {
        now_micros < self.expires_at_micros
    }
}

/// Payload of a Leader-authored audit block recording a session event.
///
/// Contains no key material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Event name, e.g. `SESSION_ESTABLISHED`.
    pub event: String,
    /// Client the event concerns.
    pub client_id: ClientId,
    /// Session expiry (µs since epoch).
    pub expires_at_micros: u64,
}

impl SessionEvent {
    /// Event name for a completed handshake.
    pub const ESTABLISHED: &'static str = "SESSION_ESTABLISHED";

    /// Audit record for a completed handshake.
    pub fn established(client_id: ClientId, expires_at_micros: u64) -> Self {
        Self {
            event: Self::ESTABLISHED.to_string(),
            client_id,
            expires_at_micros,
        }
    }
}
