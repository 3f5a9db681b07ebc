//! # Frame Handlers
//!
//! - `connection` - per-connection loop: handshakes and request dispatch
//! - `requests` - submission, read API, logout and metrics frames

mod connection;
mod requests;

pub use connection::serve_connection;
pub use requests::MAX_TAIL_BLOCKS;
