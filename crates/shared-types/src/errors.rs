//! # Error Types
//!
//! Errors for the shared data model and frame codec.

use thiserror::Error;

/// Errors produced while encoding or decoding wire frames.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Frame could not be serialized.
    #[error("Frame encoding failed: {0}")]
    Encode(String),

    /// Received bytes are not a valid frame.
    #[error("Malformed frame: {0}")]
    Decode(String),

    /// Frame exceeds the maximum accepted size.
    #[error("Frame too large: {size} bytes, max {max}")]
    TooLarge { size: usize, max: usize },
}

/// Errors produced by identifier validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentifierError {
    /// Identifier is empty.
    #[error("Identifier must not be empty")]
    Empty,

    /// Identifier is longer than allowed.
    #[error("Identifier too long: {len} bytes, max {max}")]
    TooLong { len: usize, max: usize },

    /// Identifier contains whitespace or control characters.
    #[error("Identifier contains invalid character {0:?}")]
    InvalidCharacter(char),
}
