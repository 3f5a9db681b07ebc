//! # Domain Layer
//!
//! Handshake logic with no I/O beyond reading key material.

pub mod entities;
pub mod errors;
pub mod keyring;
pub mod replay;
pub mod transcript;
