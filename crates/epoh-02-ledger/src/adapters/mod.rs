//! # Adapters
//!
//! - `storage`: `LedgerStore` implementations
//! - `infra`: clocks
//! - `registrar`: lets the authentication subsystem hand sessions to the engine

pub mod infra;
pub mod registrar;
pub mod storage;
