//! # Fedchain Crypto
//!
//! Cryptographic primitives for the Fedchain federated node.
//!
//! This crate provides Ed25519 signing and verification, used by federated
//! servers to sign acknowledgments, missing-piece requests, and directory
//! block signatures.
//!
//! ## Example
//!
//! ```rust
//! use fedchain_crypto::PrivateKey;
//!
//! // Generate a server key and sign
//! let private_key = PrivateKey::random();
//! let public_key = private_key.public_key();
//! let signature = private_key.sign(b"message");
//!
//! // Verify the signature
//! assert!(public_key.verify(b"message", &signature));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod ed25519;

// Re-export commonly used items
pub use ed25519::{PrivateKey, PublicKey, Signature};

/// Error types for cryptographic operations
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Invalid private key bytes
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Invalid public key bytes
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Invalid signature bytes
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Invalid input length
    #[error("invalid input length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Hex decoding error
    #[error("hex decoding error: {0}")]
    HexError(String),
}

impl From<hex::FromHexError> for CryptoError {
    fn from(e: hex::FromHexError) -> Self {
        CryptoError::HexError(e.to_string())
    }
}

/// Result type for cryptographic operations
pub type Result<T> = std::result::Result<T, CryptoError>;
