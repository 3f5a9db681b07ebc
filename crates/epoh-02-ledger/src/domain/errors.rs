//! # Domain Errors

use shared_crypto::CryptoError;
use shared_types::ClientId;
use thiserror::Error;

/// Errors returned by the ledger engine.
///
/// Everything before the durable append (`NoActiveSession`,
/// `AuthenticationFailed`, `PayloadTooLarge`, `Seal`) leaves the ledger
/// untouched and can be retried. `PersistenceFailure` and
/// `ConcurrentMintConflict` halt the engine; later writes get `EngineHalted`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The submission MAC does not match the session key.
    #[error("Authentication failed for {0}")]
    AuthenticationFailed(ClientId),

    /// The client has no live session.
    #[error("No active session for {0}")]
    NoActiveSession(ClientId),

    /// The durable append failed; the store was rolled back.
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    /// The store's length disagrees with the index being minted.
    #[error("Concurrent mint conflict: minting index {expected}, store holds {found} blocks")]
    ConcurrentMintConflict { expected: u64, found: u64 },

    /// A previous fatal failure stopped this engine instance from writing.
    #[error("Engine halted after a fatal persistence failure")]
    EngineHalted,

    /// Payload exceeds the configured limit.
    #[error("Payload too large: {size} bytes, max {max}")]
    PayloadTooLarge { size: usize, max: usize },

    /// The Leader could not seal the block.
    #[error("Block sealing failed: {0}")]
    Seal(#[from] CryptoError),

    /// The persisted chain does not link up; refusing to extend it.
    #[error("Persisted ledger is corrupt at index {index}: {reason}")]
    CorruptLedger { index: u64, reason: String },
}

impl LedgerError {
    /// Stable label for metrics and error frames.
    pub fn label(&self) -> &'static str {
        match self {
            LedgerError::AuthenticationFailed(_) => "authentication_failed",
            LedgerError::NoActiveSession(_) => "no_active_session",
            LedgerError::PersistenceFailure(_) => "persistence_failure",
            LedgerError::ConcurrentMintConflict { .. } => "concurrent_mint_conflict",
            LedgerError::EngineHalted => "engine_halted",
            LedgerError::PayloadTooLarge { .. } => "payload_too_large",
            LedgerError::Seal(_) => "seal_failed",
            LedgerError::CorruptLedger { .. } => "corrupt_ledger",
        }
    }
}

/// Errors from a `LedgerStore`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("I/O error during {op}: {message}")]
    Io { op: &'static str, message: String },

    /// A complete record could not be decoded.
    #[error("Corrupt record at line {line}: {reason}")]
    Corrupt { line: u64, reason: String },

    /// Appended block does not continue the stored sequence.
    #[error("Out of sequence append: expected index {expected}, got {found}")]
    OutOfSequence { expected: u64, found: u64 },
}

impl StoreError {
    pub(crate) fn io(op: &'static str, err: impl std::fmt::Display) -> Self {
        StoreError::Io {
            op,
            message: err.to_string(),
        }
    }
}
