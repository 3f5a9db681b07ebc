//! # Shared Types Crate
//!
//! This crate contains the EPOH ledger data model and the wire frames
//! exchanged between UAV clients and the Leader.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `HashChainBlock` and its hashing rule live
//!   here so the Leader and the independent verifier can never disagree on
//!   what a block hash covers.
//! - **Opaque Telemetry**: the ledger hashes and MACs payloads as raw bytes;
//!   `TelemetrySample` is only a convenience for producers and dashboards.

pub mod entities;
pub mod errors;
pub mod wire;

pub use entities::*;
pub use errors::*;
pub use wire::{logout_message, Frame, MAX_FRAME_BYTES};
