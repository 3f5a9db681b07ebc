//! # Wire Frames
//!
//! Every message between a UAV client (or dashboard) and the Leader is one
//! `Frame`, encoded as a single line of JSON tagged by `type`.
//!
//! ## Flow
//!
//! ```text
//! Client                          Leader
//!   │── Hello(id, client_nonce) ──→ │
//!   │←─ Challenge(leader_nonce, σL) │
//!   │── Response(σC) ─────────────→ │
//!   │←─ Established / Rejected ──── │
//!   │── Submit(id, payload, mac) ─→ │
//!   │←─ SubmitAck / Error ───────── │
//! ```

use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

use crate::entities::{AuthStatus, ClientId, Hash, HashChainBlock, Nonce};
use crate::errors::FrameError;

/// Largest accepted encoded frame (1 MiB).
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// A protocol message.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    /// Round trip 1, client side.
    Hello {
        client_id: ClientId,
        client_nonce: Nonce,
    },
    /// Round trip 1, leader side: the Leader's proof binding both nonces.
    Challenge {
        leader_nonce: Nonce,
        #[serde_as(as = "Hex")]
        proof: Vec<u8>,
    },
    /// Round trip 2, client side: the client's proof binding both nonces.
    Response {
        #[serde_as(as = "Hex")]
        proof: Vec<u8>,
    },
    /// Round trip 2, leader side: session created.
    Established { expires_at_micros: u64 },
    /// Handshake refused.
    Rejected { reason: String },

    /// Telemetry submission keyed with the session MAC.
    Submit {
        client_id: ClientId,
        #[serde_as(as = "Hex")]
        payload: Vec<u8>,
        #[serde_as(as = "Hex")]
        mac: Vec<u8>,
    },
    /// Durable append acknowledged.
    SubmitAck {
        index: u64,
        #[serde_as(as = "Hex")]
        block_hash: Hash,
    },

    /// Read API: last `n` blocks.
    Tail { n: usize },
    /// Read API response.
    TailResult { blocks: Vec<HashChainBlock> },
    /// Read API: session state of a client.
    AuthStatusQuery { client_id: ClientId },
    /// Read API response.
    AuthStatusResult {
        client_id: ClientId,
        status: AuthStatus,
    },

    /// End a session early; `mac` is the session MAC over the logout message.
    Logout {
        client_id: ClientId,
        #[serde_as(as = "Hex")]
        mac: Vec<u8>,
    },
    /// Session ended.
    LoggedOut { client_id: ClientId },

    /// Prometheus text exposition request.
    Metrics,
    /// Prometheus text exposition.
    MetricsResult { text: String },

    /// Request failed; `kind` is the error variant name.
    Error { kind: String, message: String },
}

impl Frame {
    /// Encode as one newline-terminated JSON line.
    pub fn encode_line(&self) -> Result<String, FrameError> {
        let mut line = serde_json::to_string(self).map_err(|e| FrameError::Encode(e.to_string()))?;
        if line.len() > MAX_FRAME_BYTES {
            return Err(FrameError::TooLarge {
                size: line.len(),
                max: MAX_FRAME_BYTES,
            });
        }
        line.push('\n');
        Ok(line)
    }

    /// Decode one line (trailing newline optional).
    pub fn decode(line: &str) -> Result<Self, FrameError> {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.len() > MAX_FRAME_BYTES {
            return Err(FrameError::TooLarge {
                size: trimmed.len(),
                max: MAX_FRAME_BYTES,
            });
        }
        serde_json::from_str(trimmed).map_err(|e| FrameError::Decode(e.to_string()))
    }

    /// Short variant name for logs and error frames.
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::Hello { .. } => "hello",
            Frame::Challenge { .. } => "challenge",
            Frame::Response { .. } => "response",
            Frame::Established { .. } => "established",
            Frame::Rejected { .. } => "rejected",
            Frame::Submit { .. } => "submit",
            Frame::SubmitAck { .. } => "submit_ack",
            Frame::Tail { .. } => "tail",
            Frame::TailResult { .. } => "tail_result",
            Frame::AuthStatusQuery { .. } => "auth_status_query",
            Frame::AuthStatusResult { .. } => "auth_status_result",
            Frame::Logout { .. } => "logout",
            Frame::LoggedOut { .. } => "logged_out",
            Frame::Metrics => "metrics",
            Frame::MetricsResult { .. } => "metrics_result",
            Frame::Error { .. } => "error",
        }
    }
}

/// Bytes MAC'd by a client to end its session.
pub fn logout_message(client_id: &ClientId) -> Vec<u8> {
    let mut message = b"EPOH-LOGOUT".to_vec();
    message.extend_from_slice(client_id.as_str().as_bytes());
    message
}
