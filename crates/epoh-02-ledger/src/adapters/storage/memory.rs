use std::sync::Arc;

use parking_lot::Mutex;
use shared_types::HashChainBlock;

use crate::domain::errors::StoreError;
use crate::ports::outbound::LedgerStore;

#[derive(Debug, Default)]
struct Inner {
    blocks: Vec<HashChainBlock>,
    failures_pending: usize,
}

/// In-memory store for tests.
///
/// Clones share the same blocks, so a test can hand one handle to an engine
/// and keep another to inspect or reopen. `fail_next_appends` simulates a
/// write that lands partially and then errors.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` appends fail after leaving a partial record.
    pub fn fail_next_appends(&self, count: usize) {
        self.inner.lock().failures_pending = count;
    }

    /// Copy of the stored blocks.
    pub fn blocks(&self) -> Vec<HashChainBlock> {
        self.inner.lock().blocks.clone()
    }
}

impl LedgerStore for MemoryStore {
    fn load(&mut self) -> Result<Vec<HashChainBlock>, StoreError> {
        Ok(self.blocks())
    }

    fn append(&mut self, block: &HashChainBlock) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let expected = inner.blocks.len() as u64;
        if block.index != expected {
            return Err(StoreError::OutOfSequence {
                expected,
                found: block.index,
            });
        }
        inner.blocks.push(block.clone());
        if inner.failures_pending > 0 {
            inner.failures_pending -= 1;
            return Err(StoreError::io("append", "injected failure"));
        }
        Ok(())
    }

    fn truncate(&mut self, len: u64) -> Result<(), StoreError> {
        let keep = usize::try_from(len).unwrap_or(usize::MAX);
        self.inner.lock().blocks.truncate(keep);
        Ok(())
    }

    fn len(&self) -> u64 {
        self.inner.lock().blocks.len() as u64
    }
}
