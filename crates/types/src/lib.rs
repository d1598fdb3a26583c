//! # Fedchain Types
//!
//! Wire-level type definitions for the Fedchain federated node.
//!
//! This crate provides the fundamental types exchanged between peers:
//! - [`ShaHash`] - 32-byte SHA-256 content hashes
//! - [`Message`] - the closed set of protocol messages, tagged by [`Command`]
//! - [`Ack`] - leader acknowledgments assigning slot indices to payloads
//! - [`MissingRequest`] - signed requests for missing payloads or acks
//! - [`GetData`] - inventory pull requests for catch-up downloads
//!
//! ## Example
//!
//! ```rust
//! use fedchain_types::{Ack, AckType, Message, Payload, ShaHash};
//!
//! // Hash some content
//! let hash = ShaHash::sha256(b"entry body");
//!
//! // A payload message carries its digest, computed once at construction
//! let msg = Message::CommitEntry(Payload::new(b"entry body".to_vec()));
//! assert_eq!(msg.digest(), hash);
//!
//! // An ack pairs a slot index with the payload it affirms
//! let ack = Ack::new(0, AckType::CommitEntry, Some(hash), 5);
//! assert!(ack.references_payload());
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod ack;
pub mod hash;
pub mod message;

// Re-export main types at crate root
pub use ack::{Ack, AckType, DirBlockSig};
pub use hash::ShaHash;
pub use message::{
    BlockPayload, Command, EntryBlockPayload, EomMarker, GetData, InvKind, InvVect,
    MissingRequest, Message, NodeId, Payload,
};

/// Result type alias for Fedchain types operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when working with Fedchain types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid hex string
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Invalid length for a fixed-size type
    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },
}

/// Domain separators for signature security
///
/// These prefixes prevent signature replay across message contexts. A
/// signature over an ack cannot be reused on a missing-piece request.
pub mod domains {
    /// Domain separator for leader acknowledgments
    pub const ACK: &[u8] = b"FEDCHAIN_ACK_V1";
    /// Domain separator for missing-piece requests
    pub const MISSING: &[u8] = b"FEDCHAIN_MISSING_V1";
    /// Domain separator for directory block signatures
    pub const DIR_BLOCK_SIG: &[u8] = b"FEDCHAIN_DBSIG_V1";
}
