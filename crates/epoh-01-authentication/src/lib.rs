//! # Authentication Subsystem (EPOH-01)
//!
//! Mutual challenge-response handshake between a telemetry client and the
//! Leader. A successful run yields a per-session symmetric key on both sides
//! without the key ever crossing the wire.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): keyring, replay guard, proof transcripts, errors
//! - **Ports Layer** (`ports/`): handshake APIs, `Transport` and `SessionRegistrar`
//! - **Service Layer** (`service.rs`): the two handshake state machines
//! - **Adapters** (`adapters/`): in-memory and TCP transports
//!
//! ## Protocol
//!
//! ```text
//! Client                                     Leader
//!   │── Hello(id, Nc) ───────────────────────→ │  unknown id / replayed Nc → Rejected
//!   │←─ Challenge(Nl, sig_L(Nl ‖ Nc ‖ id)) ─── │
//!   │   verify sig_L (LeaderUnverified)        │
//!   │── Response(sig_C(Nc ‖ Nl ‖ id)) ───────→ │  verify sig_C (ClientUnverified)
//!   │←─ Established(expiry) ────────────────── │  session registered
//!   K = KDF(Nc ‖ Nl ‖ ECDH)                     K = KDF(Nc ‖ Nl ‖ ECDH)
//! ```
//!
//! Every receive is bounded by `HandshakeConfig::round_trip_timeout`.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::memory::MemoryTransport;
pub use adapters::tcp::TcpTransport;
pub use domain::entities::{EstablishedSession, HandshakeConfig};
pub use domain::errors::{AuthError, KeyringError};
pub use domain::keyring::{load_secret_key, save_secret_key, Keyring, KeyringEntry};
pub use domain::replay::{NonceCheck, ReplayGuard};
pub use domain::transcript::{
    client_proof_message, derive_session_key, leader_proof_message, SESSION_KEY_CONTEXT,
};
pub use ports::inbound::{ClientHandshake, LeaderHandshake};
pub use ports::outbound::{SessionRegistrar, Transport, TransportError};
pub use service::{ClientAuthenticator, LeaderAuthenticator};
