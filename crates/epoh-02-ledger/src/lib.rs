//! # Ledger Engine (EPOH-02)
//!
//! The sole writer of the EPOH chain. Every telemetry submission passes
//! through one critical section: validate session and MAC, mint, persist,
//! publish. A block becomes visible to readers only after its durable append.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Sequential index | `index = chain length` under the write lock |
//! | Hash linkage | `prev_hash = last.block_hash` under the write lock |
//! | Monotonic time | wall time clamped to the predecessor's |
//! | Durable before acknowledged | publish after `LedgerStore::append` returns |
//! | Disk matches memory | failed append rolls the store back and halts the engine |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - sessions, minting, errors
//! - `ports/` - `LedgerApi` (inbound), `LedgerStore` and `TimeSource` (outbound)
//! - `service.rs` - `LedgerEngine`
//! - `adapters/` - JSON-lines and in-memory stores, clocks, session registrar

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::infra::{ManualClock, SystemClock};
pub use adapters::storage::{JsonLinesStore, MemoryStore};
pub use domain::entities::{LedgerConfig, Session, SessionEvent};
pub use domain::errors::{LedgerError, StoreError};
pub use domain::minting::{mint_block, BlockSealer};
pub use domain::sessions::SessionTable;
pub use ports::inbound::LedgerApi;
pub use ports::outbound::{LedgerStore, TimeSource};
pub use service::LedgerEngine;
