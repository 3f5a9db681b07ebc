//! # Outbound Ports (Driven Ports)
//!
//! Dependencies the handshake needs from its host.

use std::sync::Arc;

use async_trait::async_trait;
use shared_crypto::SessionKey;
use shared_types::{ClientId, Frame, FrameError};
use thiserror::Error;

/// Failure of the underlying message channel.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The peer went away.
    #[error("Connection closed")]
    Closed,

    /// Socket-level failure.
    #[error("I/O error: {0}")]
    Io(String),

    /// A frame could not be encoded or decoded.
    #[error("Frame error: {0}")]
    Frame(String),
}

impl From<FrameError> for TransportError {
    fn from(err: FrameError) -> Self {
        TransportError::Frame(err.to_string())
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err.to_string())
    }
}

/// A reliable-or-failed, ordered frame channel to one peer.
#[async_trait]
pub trait Transport: Send {
    /// Send one frame.
    async fn send(&mut self, frame: &Frame) -> Result<(), TransportError>;

    /// Receive the next frame. `Closed` once the peer has hung up.
    async fn recv(&mut self) -> Result<Frame, TransportError>;

    /// Peer description for logs.
    fn peer(&self) -> String;
}

/// Where a freshly authenticated session is handed over.
///
/// Implemented by the ledger engine, which owns session lifetime.
pub trait SessionRegistrar: Send + Sync {
    /// Install (or replace) the session of `client_id`; returns its expiry in
    /// microseconds since the Unix epoch.
    fn register_session(&self, client_id: &ClientId, session_key: SessionKey) -> u64;
}

impl<T: SessionRegistrar + ?Sized> SessionRegistrar for Arc<T> {
    fn register_session(&self, client_id: &ClientId, session_key: SessionKey) -> u64 {
        (**self).register_session(client_id, session_key)
    }
}
