//! # Adapters
//!
//! `Transport` implementations.

pub mod memory;
pub mod tcp;
