//! # UAV-EPOH Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Deployment keys, handshake helpers
//! ├── integration/      # Handshake → ledger → file → verifier
//! │   ├── scenarios.rs  # Fresh ledger, tamper, no session, two clients
//! │   ├── handshake.rs  # Key agreement, refusals, timeouts
//! │   └── ledger.rs     # Persistence failure, restart, concurrency
//! └── exploits/         # Attack simulations
//!     ├── replay.rs     # Client nonce replay
//!     └── tamper.rs     # Offline edits to the chain
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p epoh-tests
//! cargo test -p epoh-tests integration::
//! cargo test -p epoh-tests exploits::
//! ```

pub mod exploits;
pub mod fixtures;
pub mod integration;
