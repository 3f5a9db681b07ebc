//! Attack simulations against the handshake and the persisted chain.

pub mod replay;
pub mod tamper;
