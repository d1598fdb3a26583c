//! # Fedchain Mempool
//!
//! Message mempool and acknowledgment-ordered process list assembly for the
//! Fedchain federated node.
//!
//! All peer-originated protocol messages flow through this crate while the
//! leader stamps them with monotonic slot indices via acknowledgments.
//! Followers use the paired pools to reconstruct the exact ordered sequence
//! the leader committed, detect gaps, and request missing pieces.
//!
//! ## Architecture
//!
//! The crate is built from four sub-structures and one coordinator:
//! - [`ContentPool`] - content-addressed staging for payload messages and orphans
//! - [`BlockPool`] - tag-addressed staging for blocks downloaded during catch-up
//! - [`AckVector`] - the dense, slot-indexed ack log for the current minute window
//! - [`RequestTable`] - outstanding pull requests with miss counters
//! - [`MemPool`] - the public, thread-safe face that ties them together
//!
//! A single reader-writer lock guards the whole coordinator state. Traffic is
//! modest (thousands of messages per minute) and every critical section is
//! short, so the coarse lock removes the ordering hazards a per-map scheme
//! would create across ack-to-payload lookups.
//!
//! ## Data Flow
//!
//! 1. Peer handlers admit decoded messages via [`MemPool::admit`]
//! 2. Acks enter through [`MemPool::ingest_ack`], which pairs each slot with
//!    its payload and returns a missing-payload request when the pairing fails
//! 3. End-of-minute acks trigger [`MemPool::missing_ack_scan`] for gap detection
//! 4. On `EndMinute10`, [`MemPool::assemble_follower_process_list`] emits the
//!    slot-ordered log to the process list manager
//! 5. A janitor tick drives [`MemPool::cleanup_after_build`] and
//!    [`MemPool::relay_stale`]

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod ack_vector;
pub mod block_pool;
pub mod content_pool;
pub mod coordinator;
pub mod request_table;

// Re-export main types at crate root
pub use ack_vector::{AckVector, SlotOutcome};
pub use block_pool::BlockPool;
pub use content_pool::ContentPool;
pub use coordinator::{
    MemPool, MemPoolContext, MemPoolStats, MockProcessList, ProcessListItem, ProcessListManager,
};
pub use request_table::{RequestRecord, RequestTable};

/// Maximum number of messages the content pool admits.
pub const MAX_TX_POOL_SIZE: usize = 10_000;

/// Maximum number of orphan messages held while their prerequisites arrive.
pub const MAX_ORPHAN_SIZE: usize = 1_000;

/// Maximum number of blocks staged during catch-up.
pub const MAX_BLK_POOL_SIZE: usize = 500;

/// Initial addressable length of the ack vector.
pub const ACK_POOL_INITIAL_LEN: usize = 100;

/// Initial capacity of the ack vector.
pub const ACK_POOL_INITIAL_CAP: usize = 200;

/// Step by which the ack vector length grows when an insert lands past the end.
pub const ACK_POOL_GROWTH_STEP: usize = 50;

/// Result type alias for mempool operations
pub type Result<T> = std::result::Result<T, MemPoolError>;

/// Errors that can occur in mempool operations
#[derive(Debug, thiserror::Error)]
pub enum MemPoolError {
    /// Content pool is at capacity and cannot accept more messages
    #[error("message pool at capacity ({0} messages)")]
    PoolFull(usize),

    /// Orphan pool is at capacity
    #[error("orphan pool at capacity ({0} messages)")]
    OrphanPoolFull(usize),

    /// Block pool is at capacity
    #[error("block pool at capacity ({0} blocks)")]
    BlockPoolFull(usize),

    /// Process list assembly invoked before the terminal EndMinute10 ack
    #[error("process list assembly requires the EndMinute10 ack in its slot")]
    NotTerminal,

    /// A slot already holds a different ack with the same index
    #[error("conflicting ack for slot {index}: slot already holds a different ack")]
    ConflictingAck {
        /// Slot index of the collision
        index: u32,
    },
}
