//! # Node Runtime Library
//!
//! The Leader process as a library, so integration tests can run it
//! in-process. The `epoh-leader` binary is a thin wrapper.
//!
//! ## Modules
//!
//! - `container/` - configuration and subsystem wiring
//! - `handlers/` - per-connection frame handling
//! - `server` - accept loop, housekeeping, shutdown

pub mod container;
pub mod handlers;
pub mod server;

#[cfg(test)]
mod test_utils;

pub use container::{ConfigError, LeaderContainer, NodeConfig, NodeContainer};
pub use server::LeaderRuntime;
