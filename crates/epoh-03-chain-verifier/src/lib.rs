//! # Chain Verifier (EPOH-03)
//!
//! Independent audit of a persisted ledger. The verifier never talks to the
//! Leader and never needs session keys: it streams the JSON-lines file and
//! checks every record against its predecessor and, when given a keyring,
//! against the Leader's public identity.
//!
//! ## Checks
//!
//! | Check | Violation |
//! |-------|-----------|
//! | First block has index 0 and the sentinel `prev_hash` | `GenesisMismatch` |
//! | Stored `block_hash` equals its recomputation | `HashMismatch` |
//! | `prev_hash` equals the recomputed hash of the previous record | `BrokenLink` |
//! | `index` is the previous index plus one | `IndexGap` |
//! | Wall time does not go backwards | `TimeRegression` |
//! | Seal verifies under the Leader key, client is registered | `SignatureInvalid` |
//! | Complete line parses as a block | `MalformedRecord` |
//!
//! All violations are collected in one pass. A trailing line without its
//! newline that does not parse is a snapshot taken mid-append and is reported
//! as a note.

pub mod adapters;
pub mod domain;
pub mod service;

pub use adapters::reader::{LedgerReader, Record};
pub use domain::errors::VerifierError;
pub use domain::report::{IntegrityViolation, VerificationReport, ViolationKind};
pub use service::ChainVerifier;
