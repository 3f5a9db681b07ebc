//! Storage Adapters
//!
//! Implementations of the `LedgerStore` trait.

mod jsonl;
mod memory;

pub use jsonl::JsonLinesStore;
pub use memory::MemoryStore;
