//! # Ports Layer
//!
//! - **Inbound (Driving)**: the two handshake roles
//! - **Outbound (Driven)**: the message channel and the session sink

pub mod inbound;
pub mod outbound;
