//! Ledger file access.

pub mod reader;
