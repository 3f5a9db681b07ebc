//! # Handshake Entities

use std::time::Duration;

use shared_crypto::SessionKey;
use shared_types::{ClientId, Nonce};

/// Default bound on each handshake round trip.
pub const DEFAULT_ROUND_TRIP_TIMEOUT: Duration = Duration::from_secs(5);

/// Default client nonce retention (24 h).
pub const DEFAULT_REPLAY_WINDOW: Duration = Duration::from_secs(86_400);

/// Remembered nonces per client before new handshakes for it are refused.
pub const DEFAULT_MAX_NONCES_PER_CLIENT: usize = 4_096;

/// Tunables shared by both handshake roles.
#[derive(Debug, Clone)]
pub struct HandshakeConfig {
    /// Upper bound for each wait on the peer.
    pub round_trip_timeout: Duration,
    /// How long a used client nonce is remembered (Leader only).
    pub replay_window: Duration,
    /// Maximum remembered nonces per client (Leader only).
    pub max_nonces_per_client: usize,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            round_trip_timeout: DEFAULT_ROUND_TRIP_TIMEOUT,
            replay_window: DEFAULT_REPLAY_WINDOW,
            max_nonces_per_client: DEFAULT_MAX_NONCES_PER_CLIENT,
        }
    }
}

/// Result of a successful handshake, as seen by either party.
#[derive(Debug, Clone)]
pub struct EstablishedSession {
    /// Authenticated client.
    pub client_id: ClientId,
    /// Nonce contributed by the client.
    pub client_nonce: Nonce,
    /// Nonce contributed by the Leader.
    pub leader_nonce: Nonce,
    /// Derived symmetric key for submission MACs.
    pub session_key: SessionKey,
    /// Session expiry announced by the Leader (µs since epoch).
    pub expires_at_micros: u64,
}
