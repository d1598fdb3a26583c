//! Content digests for pool addressing.
//!
//! Every payload message is addressed by the SHA-256 digest of its bytes:
//! the mempool keys on it, acks affirm it, and missing-piece requests name
//! it. [`ShaHash`] is that digest as a plain value type. Digesting is total,
//! and a message computes its digest exactly once at construction, so the
//! hash is always available without re-reading the payload.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Length of a digest in bytes.
pub const SHA_HASH_LEN: usize = 32;

/// A 32-byte SHA-256 content digest.
///
/// The all-zero digest is reserved as a placeholder: missing-ack requests
/// carry it because an empty slot has no payload hash to name. Real content
/// never digests to zero, so [`ShaHash::is_zero`] is a reliable
/// "no payload" check on the wire.
///
/// # Example
///
/// ```rust
/// use fedchain_types::ShaHash;
///
/// let digest = ShaHash::sha256(b"entry body");
/// assert!(!digest.is_zero());
/// assert_eq!(ShaHash::from_hex(&digest.to_hex()).unwrap(), digest);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ShaHash([u8; SHA_HASH_LEN]);

impl ShaHash {
    /// The all-zero placeholder digest.
    pub const ZERO: Self = Self([0u8; SHA_HASH_LEN]);

    /// Digests a byte slice.
    pub fn sha256(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Digests several slices as if they were one contiguous input.
    ///
    /// Used where a digest covers multiple fields of a message without
    /// materializing their concatenation.
    pub fn sha256_concat(parts: &[&[u8]]) -> Self {
        let hasher = parts
            .iter()
            .fold(Sha256::new(), |hasher, part| hasher.chain_update(part));
        Self(hasher.finalize().into())
    }

    /// Wraps a digest that was already computed.
    pub const fn new(bytes: [u8; SHA_HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Reads a digest out of a wire buffer.
    ///
    /// Fails unless the slice is exactly [`SHA_HASH_LEN`] bytes.
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        let bytes: [u8; SHA_HASH_LEN] = slice.try_into().map_err(|_| Error::InvalidLength {
            expected: SHA_HASH_LEN,
            actual: slice.len(),
        })?;
        Ok(Self(bytes))
    }

    /// Parses the 64-character hex form, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        Self::from_slice(&hex::decode(s)?)
    }

    /// The 64-character lowercase hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// The digest bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; SHA_HASH_LEN] {
        &self.0
    }

    /// Returns true for the placeholder digest.
    #[inline]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl From<[u8; SHA_HASH_LEN]> for ShaHash {
    fn from(bytes: [u8; SHA_HASH_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for ShaHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ShaHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // first four bytes are plenty to tell digests apart in a log line
        write!(f, "ShaHash({}..)", hex::encode(&self.0[..4]))
    }
}

impl Serialize for ShaHash {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ShaHash {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_known_vector() {
        // SHA-256("hello")
        let digest = ShaHash::sha256(b"hello");
        assert_eq!(
            digest.to_hex(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_empty_input_is_not_zero() {
        // even an empty payload has a real digest, distinct from the placeholder
        let digest = ShaHash::sha256(b"");
        assert!(!digest.is_zero());
        assert_eq!(
            digest.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_concat_matches_contiguous() {
        let split = ShaHash::sha256_concat(&[b"commit", b" ", b"entry"]);
        let whole = ShaHash::sha256(b"commit entry");
        assert_eq!(split, whole);
    }

    #[test]
    fn test_zero_placeholder() {
        assert!(ShaHash::ZERO.is_zero());
        assert_eq!(ShaHash::default(), ShaHash::ZERO);
        assert_ne!(ShaHash::sha256(b"x"), ShaHash::ZERO);
    }

    #[test]
    fn test_hex_round_trip() {
        let digest = ShaHash::sha256(b"round trip");
        assert_eq!(ShaHash::from_hex(&digest.to_hex()).unwrap(), digest);
        assert_eq!(
            ShaHash::from_hex(&format!("0x{}", digest.to_hex())).unwrap(),
            digest
        );
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(ShaHash::from_hex("2cf24d").is_err());
        assert!(ShaHash::from_hex(&"ab".repeat(33)).is_err());
        assert!(ShaHash::from_hex(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn test_wire_slice_round_trip() {
        let digest = ShaHash::sha256(b"wire");
        let restored = ShaHash::from_slice(digest.as_bytes()).unwrap();
        assert_eq!(restored, digest);

        let err = ShaHash::from_slice(&[1u8; 16]).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidLength {
                expected: SHA_HASH_LEN,
                actual: 16
            }
        ));
    }

    #[test]
    fn test_serde_as_hex_string() {
        let digest = ShaHash::sha256(b"serde");
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"{}\"", digest.to_hex()));
        let decoded: ShaHash = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, digest);
    }

    #[test]
    fn test_debug_is_truncated() {
        let digest = ShaHash::sha256(b"hello");
        assert_eq!(format!("{:?}", digest), "ShaHash(2cf24dba..)");
    }
}
