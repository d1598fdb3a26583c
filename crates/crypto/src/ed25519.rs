//! # Ed25519 Signatures
//!
//! This module provides Ed25519 signing and verification for federated
//! server identities.
//!
//! ## Key Types
//!
//! - `PrivateKey` - 32-byte secret key for signing
//! - `PublicKey` - 32-byte verifying key
//! - `Signature` - 64-byte detached signature
//!
//! ## Example
//!
//! ```rust
//! use fedchain_crypto::ed25519::PrivateKey;
//!
//! // Generate a random private key
//! let private_key = PrivateKey::random();
//!
//! // Get the public key
//! let public_key = private_key.public_key();
//!
//! // Sign a message
//! let signature = private_key.sign(b"Hello, Fedchain!");
//!
//! // Verify the signature
//! assert!(public_key.verify(b"Hello, Fedchain!", &signature));
//! ```

use crate::{CryptoError, Result};
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Ed25519 private key (32 bytes)
///
/// This is the secret key used for signing. Keep it secure!
#[derive(Clone)]
pub struct PrivateKey {
    inner: SigningKey,
}

impl PrivateKey {
    /// Generate a random private key using a cryptographically secure RNG.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fedchain_crypto::ed25519::PrivateKey;
    ///
    /// let key = PrivateKey::random();
    /// ```
    pub fn random() -> Self {
        Self {
            inner: SigningKey::generate(&mut OsRng),
        }
    }

    /// Create a private key from raw bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            inner: SigningKey::from_bytes(bytes),
        }
    }

    /// Create a private key from a hex string.
    ///
    /// # Arguments
    ///
    /// * `hex` - Hex-encoded private key (with or without 0x prefix)
    pub fn from_hex(hex: &str) -> Result<Self> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let bytes = hex::decode(hex)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidPrivateKey("expected 32 bytes".into()))?;
        Ok(Self::from_bytes(&arr))
    }

    /// Returns the raw key bytes.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes()
    }

    /// Returns the corresponding public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            inner: self.inner.verifying_key(),
        }
    }

    /// Signs a message, returning a detached signature.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.inner.sign(message).to_bytes())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material
        write!(f, "PrivateKey(..)")
    }
}

/// Ed25519 public key (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    inner: VerifyingKey,
}

impl PublicKey {
    /// Create a public key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid curve point.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        let inner = VerifyingKey::from_bytes(bytes)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Returns the raw key bytes.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes()
    }

    /// Verifies a detached signature over a message.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
        self.inner.verify(message, &sig).is_ok()
    }
}

/// Ed25519 detached signature (64 bytes)
///
/// `Default` is the all-zero signature, used when constructing a message
/// before it is signed.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; 64]);

impl Signature {
    /// Create a signature from raw bytes.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Returns the raw signature bytes.
    pub fn to_bytes(&self) -> [u8; 64] {
        self.0
    }

    /// Returns true if this is the all-zero placeholder signature.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 64]
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self([0u8; 64])
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode(&self.0[..8]))
    }
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        let arr: [u8; 64] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 64 bytes"))?;
        Ok(Self(arr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_generation() {
        let key1 = PrivateKey::random();
        let key2 = PrivateKey::random();
        assert_ne!(key1.to_bytes(), key2.to_bytes());
    }

    #[test]
    fn test_from_bytes_roundtrip() {
        let key = PrivateKey::random();
        let restored = PrivateKey::from_bytes(&key.to_bytes());
        assert_eq!(key.to_bytes(), restored.to_bytes());
        assert_eq!(key.public_key(), restored.public_key());
    }

    #[test]
    fn test_sign_and_verify() {
        let key = PrivateKey::random();
        let public = key.public_key();
        let data = b"test data";

        let sig = key.sign(data);
        assert!(public.verify(data, &sig));
        assert!(!public.verify(b"wrong data", &sig));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let key = PrivateKey::random();
        let other = PrivateKey::random().public_key();

        let sig = key.sign(b"message");
        assert!(!other.verify(b"message", &sig));
    }

    #[test]
    fn test_zero_signature() {
        let sig = Signature::default();
        assert!(sig.is_zero());

        let key = PrivateKey::random();
        assert!(!key.sign(b"x").is_zero());
    }

    #[test]
    fn test_signature_serde() {
        let key = PrivateKey::random();
        let sig = key.sign(b"payload");
        let json = serde_json::to_string(&sig).unwrap();
        let decoded: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(sig, decoded);
    }
}
