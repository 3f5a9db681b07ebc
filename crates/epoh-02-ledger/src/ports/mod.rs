//! # Ports Layer
//!
//! - **Inbound (Driving)**: `LedgerApi`
//! - **Outbound (Driven)**: `LedgerStore`, `TimeSource`

pub mod inbound;
pub mod outbound;
