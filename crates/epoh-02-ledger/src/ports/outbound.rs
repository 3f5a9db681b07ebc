//! # Outbound Ports (Driven Ports)
//!
//! Production: `JsonLinesStore`, `SystemClock`
//! Testing: `MemoryStore`, `ManualClock`

use shared_types::HashChainBlock;

use crate::domain::errors::StoreError;

/// Append-only block persistence.
///
/// Only the engine's write path touches a store, one call at a time.
pub trait LedgerStore: Send {
    /// Read every persisted block in order.
    fn load(&mut self) -> Result<Vec<HashChainBlock>, StoreError>;

    /// Durably append one block. `block.index` must equal `len()`.
    ///
    /// Returns only after the record is on stable storage.
    fn append(&mut self, block: &HashChainBlock) -> Result<(), StoreError>;

    /// Discard everything after the first `len` blocks, including any partial
    /// record left by a failed append.
    fn truncate(&mut self, len: u64) -> Result<(), StoreError>;

    /// Number of durable blocks.
    fn len(&self) -> u64;

    /// Whether no block is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Clock used for block timestamps and session expiry.
pub trait TimeSource: Send + Sync {
    /// Microseconds since the Unix epoch.
    fn wall_micros(&self) -> u64;

    /// Microseconds on a monotonic clock since process start.
    fn monotonic_micros(&self) -> u64;
}
