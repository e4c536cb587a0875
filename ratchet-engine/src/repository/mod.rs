//! Repository layer
//!
//! The storage contract the engine depends on, plus the in-memory reference
//! adapter. Durable backends (filesystem, relational, key-value) live in
//! their own crates and implement [`JobStore`].
//!
//! The contract is trait-based to keep backends selectable at construction
//! time and to enable testing against the in-memory adapter.

mod jobs;
mod memory;

// Re-export the contract
pub use jobs::{JobStore, StoreError};

// Re-export the reference implementation
pub use memory::MemoryJobStore;
