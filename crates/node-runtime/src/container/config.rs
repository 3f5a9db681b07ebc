//! # Node Configuration
//!
//! Every field has a default and an `EPOH_*` environment override.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `EPOH_NODE_ID` | `Leader_Node_1` |
//! | `EPOH_LISTEN_ADDR` | `127.0.0.1:50001` |
//! | `EPOH_LEDGER_PATH` | `epoh_ledger.jsonl` |
//! | `EPOH_KEYRING` | `keys/keyring.json` |
//! | `EPOH_LEADER_KEY` | `keys/Leader_Node_1.key` |
//! | `EPOH_HANDSHAKE_TIMEOUT_MS` | `5000` |
//! | `EPOH_SESSION_TTL_SECS` | `3600` |
//! | `EPOH_REPLAY_WINDOW_SECS` | `86400` |
//! | `EPOH_AUDIT_SESSIONS` | `true` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use epoh_01_authentication::HandshakeConfig;
use epoh_02_ledger::LedgerConfig;
use shared_types::ClientId;
use thiserror::Error;

/// Complete Leader configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeConfig {
    /// Leader identity name, must match the keyring's Leader entry.
    pub node_id: String,
    /// TCP listen address.
    pub listen_addr: SocketAddr,
    /// JSON-lines ledger file.
    pub ledger_path: PathBuf,
    /// Public identities.
    pub keyring_path: PathBuf,
    /// Leader's secret key file.
    pub leader_key_path: PathBuf,
    /// Bound on each handshake round trip.
    pub handshake_timeout: Duration,
    /// Session lifetime.
    pub session_ttl: Duration,
    /// How long used client nonces are remembered.
    pub replay_window: Duration,
    /// Mint a `SESSION_ESTABLISHED` block per handshake.
    pub audit_sessions: bool,
    /// Period of the session and nonce cleanup task.
    pub housekeeping_interval: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: "Leader_Node_1".to_string(),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 50001)),
            ledger_path: PathBuf::from("epoh_ledger.jsonl"),
            keyring_path: PathBuf::from("keys/keyring.json"),
            leader_key_path: PathBuf::from("keys/Leader_Node_1.key"),
            handshake_timeout: Duration::from_millis(5000),
            session_ttl: Duration::from_secs(3600),
            replay_window: Duration::from_secs(86_400),
            audit_sessions: true,
            housekeeping_interval: Duration::from_secs(30),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is set but does not parse.
    #[error("{var}={value:?} is not valid: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    /// The node id is not a usable identifier.
    #[error("invalid node id: {0}")]
    InvalidNodeId(String),

    /// A duration that must be positive is zero.
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

fn parse_var<T>(var: &'static str, lookup: &impl Fn(&str) -> Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                var,
                value,
                reason: e.to_string(),
            }),
    }
}

fn parse_flag(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value,
            reason: "expected true or false".to_string(),
        }),
    }
}

impl NodeConfig {
    /// Defaults overridden by `EPOH_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults overridden by whatever `lookup` returns.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(id) = lookup("EPOH_NODE_ID") {
            config.node_id = id;
        }
        if let Some(addr) = parse_var("EPOH_LISTEN_ADDR", &lookup)? {
            config.listen_addr = addr;
        }
        if let Some(path) = lookup("EPOH_LEDGER_PATH") {
            config.ledger_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("EPOH_KEYRING") {
            config.keyring_path = PathBuf::from(path);
        }
        match lookup("EPOH_LEADER_KEY") {
            Some(path) => config.leader_key_path = PathBuf::from(path),
            None => config.leader_key_path = PathBuf::from(format!("keys/{}.key", config.node_id)),
        }
        if let Some(ms) = parse_var::<u64>("EPOH_HANDSHAKE_TIMEOUT_MS", &lookup)? {
            config.handshake_timeout = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64>("EPOH_SESSION_TTL_SECS", &lookup)? {
            config.session_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>("EPOH_REPLAY_WINDOW_SECS", &lookup)? {
            config.replay_window = Duration::from_secs(secs);
        }
        if let Some(value) = lookup("EPOH_AUDIT_SESSIONS") {
            config.audit_sessions = parse_flag("EPOH_AUDIT_SESSIONS", value)?;
        }

        Ok(config)
    }

    /// Reject settings the Leader cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ClientId::parse(self.node_id.clone())
            .map_err(|e| ConfigError::InvalidNodeId(e.to_string()))?;
        if self.handshake_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("EPOH_HANDSHAKE_TIMEOUT_MS"));
        }
        if self.session_ttl.is_zero() {
            return Err(ConfigError::ZeroDuration("EPOH_SESSION_TTL_SECS"));
        }
        if self.housekeeping_interval.is_zero() {
            return Err(ConfigError::ZeroDuration("housekeeping interval"));
        }
        if self.replay_window < self.session_ttl {
            tracing::warn!(
                replay_window_secs = self.replay_window.as_secs(),
                session_ttl_secs = self.session_ttl.as_secs(),
                "replay window shorter than session lifetime"
            );
        }
        Ok(())
    }

    /// Leader identity.
    pub fn leader_id(&self) -> ClientId {
        ClientId::new(self.node_id.clone())
    }

    /// Settings for the ledger engine.
    pub fn ledger_config(&self) -> LedgerConfig {
        let mut config = LedgerConfig::new(self.leader_id());
        config.session_ttl = self.session_ttl;
        config
    }

    /// Settings for the handshake.
    pub fn handshake_config(&self) -> HandshakeConfig {
        HandshakeConfig {
            round_trip_timeout: self.handshake_timeout,
            replay_window: self.replay_window,
            ..HandshakeConfig::default()
        }
    }
}
