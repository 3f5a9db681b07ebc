//! # Core Domain Entities
//!
//! The EPOH ledger data model.
//!
//! ## Clusters
//!
//! - **Chain**: `HashChainBlock`, `BlockTimestamp`, `BlockSeal`
//! - **Identity**: `ClientId`, `Nonce`
//! - **Read API**: `AuthStatus`
//! - **Telemetry**: `TelemetrySample`

use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use sha2::{Digest, Sha256};

use crate::errors::IdentifierError;

// =============================================================================
// CLUSTER A: THE CHAIN
// =============================================================================

/// A 32-byte SHA-256 digest.
pub type Hash = [u8; 32];

/// Predecessor hash of the genesis block.
pub const GENESIS_PREV_HASH: Hash = [0u8; 32];

/// Domain separation tag prefixed to every block hash preimage.
pub const BLOCK_HASH_DOMAIN: &[u8] = b"EPOH-BLOCK-v1";

/// Payload of the genesis block.
pub const GENESIS_PAYLOAD: &[u8] = b"System Initialized";

/// Mint time of a block.
///
/// `wall_micros` is the chronological timestamp that must never regress along
/// the chain. `monotonic_micros` is the Leader's monotonic clock since process
/// start; it is hashed for auditability but resets when the Leader restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct BlockTimestamp {
    /// Microseconds since the Unix epoch.
    pub wall_micros: u64,
    /// Microseconds since Leader process start.
    pub monotonic_micros: u64,
}

impl BlockTimestamp {
    /// Whether `self` is chronologically not earlier than `earlier`.
    pub fn is_not_before(&self, earlier: &BlockTimestamp) -> bool {
        self.wall_micros >= earlier.wall_micros
    }
}

/// The authenticator attached to a minted block (`mac_or_sig`).
///
/// A signature by `signer`'s long-term key over
/// [`HashChainBlock::seal_message`]. It is not covered by `block_hash`.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSeal {
    /// Identity whose long-term key produced the signature.
    pub signer: ClientId,
    /// Scheme-specific signature bytes.
    #[serde_as(as = "Hex")]
    pub signature: Vec<u8>,
}

/// One immutable, hash-chained ledger entry.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashChainBlock {
    /// Position in the chain, 0 for genesis.
    pub index: u64,
    /// Mint time.
    pub timestamp: BlockTimestamp,
    /// Identity that submitted the payload.
    pub client_id: ClientId,
    /// Opaque telemetry bytes.
    #[serde_as(as = "Hex")]
    pub telemetry_payload: Vec<u8>,
    /// `block_hash` of the block at `index - 1`, or the genesis sentinel.
    #[serde_as(as = "Hex")]
    pub prev_hash: Hash,
    /// SHA-256 over the canonical encoding of the fields above.
    #[serde_as(as = "Hex")]
    pub block_hash: Hash,
    /// Leader seal over `block_hash` and `client_id`.
    pub mac_or_sig: BlockSeal,
}

impl HashChainBlock {
    /// Recompute the block hash from the stored fields.
    pub fn recompute_hash(&self) -> Hash {
        compute_block_hash(
            self.index,
            &self.timestamp,
            &self.client_id,
            &self.telemetry_payload,
            &self.prev_hash,
        )
    }

    /// Whether the stored `block_hash` matches its recomputation.
    pub fn hash_is_consistent(&self) -> bool {
        self.recompute_hash() == self.block_hash
    }

    /// Bytes covered by the block seal.
    pub fn seal_message(block_hash: &Hash, client_id: &ClientId) -> Vec<u8> {
        let id = client_id.as_str().as_bytes();
        let mut message = Vec::with_capacity(11 + 32 + 4 + id.len());
        message.extend_from_slice(b"EPOH-SEAL-1");
        message.extend_from_slice(block_hash);
        message.extend_from_slice(&(id.len() as u32).to_be_bytes());
        message.extend_from_slice(id);
        message
    }

    /// Hex prefix of the block hash for log lines.
    pub fn short_hash(&self) -> String {
        hex::encode(&self.block_hash[..5])
    }
}

/// Compute `H(index ‖ timestamp ‖ client_id ‖ payload ‖ prev_hash)`.
///
/// Variable-length fields are length-prefixed so that no two distinct blocks
/// share a preimage.
pub fn compute_block_hash(
    index: u64,
    timestamp: &BlockTimestamp,
    client_id: &ClientId,
    payload: &[u8],
    prev_hash: &Hash,
) -> Hash {
    let id = client_id.as_str().as_bytes();
    let mut hasher = Sha256::new();
    hasher.update(BLOCK_HASH_DOMAIN);
    hasher.update(index.to_be_bytes());
    hasher.update(timestamp.wall_micros.to_be_bytes());
    hasher.update(timestamp.monotonic_micros.to_be_bytes());
    hasher.update((id.len() as u32).to_be_bytes());
    hasher.update(id);
    hasher.update((payload.len() as u32).to_be_bytes());
    hasher.update(payload);
    hasher.update(prev_hash);
    hasher.finalize().into()
}

// =============================================================================
// CLUSTER B: IDENTITY
// =============================================================================

/// Maximum length of a client or leader identifier in bytes.
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Name of a registered identity (UAV or Leader), e.g. `UAV_A1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Create an identifier without validation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create an identifier, rejecting empty, oversized or whitespace ids.
    pub fn parse(id: impl Into<String>) -> Result<Self, IdentifierError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if id.len() > MAX_IDENTIFIER_LEN {
            return Err(IdentifierError::TooLong {
                len: id.len(),
                max: MAX_IDENTIFIER_LEN,
            });
        }
        if let Some(c) = id.chars().find(|c| c.is_whitespace() || c.is_control()) {
            return Err(IdentifierError::InvalidCharacter(c));
        }
        Ok(Self(id))
    }

    /// Borrow as `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Length of a handshake nonce in bytes.
pub const NONCE_LEN: usize = 32;

/// Single-use random challenge value.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Nonce(#[serde_as(as = "Hex")] [u8; NONCE_LEN]);

impl Nonce {
    /// Draw a fresh nonce from the thread RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Wrap raw bytes.
    pub fn from_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce({}..)", hex::encode(&self.0[..4]))
    }
}

// =============================================================================
// CLUSTER C: READ API
// =============================================================================

/// Session state of a client as seen by the Leader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuthStatus {
    /// A session is live.
    Active {
        established_at_micros: u64,
        expires_at_micros: u64,
    },
    /// The last session lapsed and has not been renewed.
    Expired { expired_at_micros: u64 },
    /// No session has been established since Leader start (or after logout).
    NotAuthenticated,
}

impl AuthStatus {
    /// Whether submissions are currently accepted for this client.
    pub fn is_active(&self) -> bool {
        matches!(self, AuthStatus::Active { .. })
    }
}

// =============================================================================
// CLUSTER D: TELEMETRY
// =============================================================================

/// Flight state sample produced by a UAV, serialized as the block payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// North position in metres (NED).
    pub x_pos: f64,
    /// East position in metres (NED).
    pub y_pos: f64,
    /// Down position in metres (NED, negative is up).
    pub z_alt: f64,
    /// Speed magnitude in m/s.
    pub vel_mag: f64,
    /// Optional flight phase marker, e.g. `LANDING_FINAL`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl TelemetrySample {
    /// Encode as the JSON payload bytes submitted to the ledger.
    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode a payload, if it is a telemetry sample.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        serde_json::from_slice(payload).ok()
    }
}
