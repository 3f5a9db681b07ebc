//! Cross-crate flows: handshake, engine, persistence and verification together.

pub mod handshake;
pub mod ledger;
pub mod scenarios;
