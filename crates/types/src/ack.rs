//! Leader acknowledgments and directory block signatures.
//!
//! An [`Ack`] is the leader's stamp assigning a slot index to a payload hash
//! within the current minute window. Followers reconstruct the leader's
//! ordering from the ack sequence alone; the payload bytes travel
//! separately. The ten `EndMinute` ack types mark minute boundaries, with
//! `EndMinute10` closing the window.

use crate::message::NodeId;
use crate::{domains, ShaHash};
use fedchain_crypto::Signature;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of a leader acknowledgment.
///
/// The first five variants reference a payload message by hash; the ten
/// `EndMinute` variants are bare minute markers and carry no affirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckType {
    /// Acknowledges a chain commit
    CommitChain,
    /// Acknowledges a chain reveal
    RevealChain,
    /// Acknowledges an entry commit
    CommitEntry,
    /// Acknowledges an entry reveal
    RevealEntry,
    /// Acknowledges a factoid transaction
    FactoidTx,
    /// End of minute 1
    EndMinute1,
    /// End of minute 2
    EndMinute2,
    /// End of minute 3
    EndMinute3,
    /// End of minute 4
    EndMinute4,
    /// End of minute 5
    EndMinute5,
    /// End of minute 6
    EndMinute6,
    /// End of minute 7
    EndMinute7,
    /// End of minute 8
    EndMinute8,
    /// End of minute 9
    EndMinute9,
    /// End of minute 10 - closes the window
    EndMinute10,
}

impl AckType {
    /// Returns true if this is one of the ten end-of-minute markers.
    pub fn is_end_of_minute(&self) -> bool {
        self.minute().is_some()
    }

    /// Returns true if acks of this type reference a payload message.
    pub fn references_payload(&self) -> bool {
        matches!(
            self,
            AckType::CommitChain
                | AckType::RevealChain
                | AckType::CommitEntry
                | AckType::RevealEntry
                | AckType::FactoidTx
        )
    }

    /// The minute this marker closes, or `None` for payload-bearing types.
    pub fn minute(&self) -> Option<u8> {
        match self {
            AckType::EndMinute1 => Some(1),
            AckType::EndMinute2 => Some(2),
            AckType::EndMinute3 => Some(3),
            AckType::EndMinute4 => Some(4),
            AckType::EndMinute5 => Some(5),
            AckType::EndMinute6 => Some(6),
            AckType::EndMinute7 => Some(7),
            AckType::EndMinute8 => Some(8),
            AckType::EndMinute9 => Some(9),
            AckType::EndMinute10 => Some(10),
            _ => None,
        }
    }

    fn wire_tag(&self) -> u8 {
        match self {
            AckType::CommitChain => 0,
            AckType::RevealChain => 1,
            AckType::CommitEntry => 2,
            AckType::RevealEntry => 3,
            AckType::FactoidTx => 4,
            AckType::EndMinute1 => 11,
            AckType::EndMinute2 => 12,
            AckType::EndMinute3 => 13,
            AckType::EndMinute4 => 14,
            AckType::EndMinute5 => 15,
            AckType::EndMinute6 => 16,
            AckType::EndMinute7 => 17,
            AckType::EndMinute8 => 18,
            AckType::EndMinute9 => 19,
            AckType::EndMinute10 => 20,
        }
    }
}

impl fmt::Display for AckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.minute() {
            Some(m) => write!(f, "EndMinute{}", m),
            None => write!(f, "{:?}", self),
        }
    }
}

/// A leader acknowledgment assigning a slot index to a payload hash.
///
/// Two acks are equal iff their user-visible fields match; the signature is
/// excluded from equality since it is checked by the wire layer before the
/// ack reaches the pools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    /// Slot index within the current minute window, monotonic per leader
    pub index: u32,
    /// What this ack acknowledges
    pub ack_type: AckType,
    /// Hash of the payload this slot references; absent for minute markers
    pub affirmation: Option<ShaHash>,
    /// Directory block height the window belongs to
    pub height: u32,
    /// Leader signature over [`Ack::signing_bytes`]
    pub signature: Signature,
}

impl Ack {
    /// Creates a new unsigned ack.
    pub fn new(index: u32, ack_type: AckType, affirmation: Option<ShaHash>, height: u32) -> Self {
        Self {
            index,
            ack_type,
            affirmation,
            height,
            signature: Signature::default(),
        }
    }

    /// Returns the bytes the leader signs for this ack.
    ///
    /// Includes a domain separator to prevent cross-context signature replay.
    pub fn signing_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(domains::ACK.len() + 41);
        bytes.extend(domains::ACK);
        bytes.extend(&self.index.to_le_bytes());
        bytes.push(self.ack_type.wire_tag());
        match &self.affirmation {
            Some(hash) => bytes.extend(hash.as_bytes()),
            None => bytes.extend(&[0u8; 32]),
        }
        bytes.extend(&self.height.to_le_bytes());
        bytes
    }

    /// Returns true if this ack is an end-of-minute marker.
    pub fn is_end_of_minute(&self) -> bool {
        self.ack_type.is_end_of_minute()
    }

    /// Returns true if this ack references a payload message.
    pub fn references_payload(&self) -> bool {
        self.ack_type.references_payload()
    }
}

impl PartialEq for Ack {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
            && self.ack_type == other.ack_type
            && self.affirmation == other.affirmation
            && self.height == other.height
    }
}

impl Eq for Ack {}

/// A federated server's signature over a completed directory block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirBlockSig {
    /// Height of the directory block being signed
    pub height: u32,
    /// Identity of the signing server
    pub signer: NodeId,
    /// Signature over [`DirBlockSig::signing_bytes`]
    pub signature: Signature,
}

impl DirBlockSig {
    /// Creates a new unsigned directory block signature message.
    pub fn new(height: u32, signer: NodeId) -> Self {
        Self {
            height,
            signer,
            signature: Signature::default(),
        }
    }

    /// Returns the bytes the server signs for this message.
    pub fn signing_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(domains::DIR_BLOCK_SIG.len() + 36);
        bytes.extend(domains::DIR_BLOCK_SIG);
        bytes.extend(&self.height.to_le_bytes());
        bytes.extend(&self.signer);
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ack_type_predicates() {
        assert!(AckType::CommitChain.references_payload());
        assert!(AckType::FactoidTx.references_payload());
        assert!(!AckType::EndMinute1.references_payload());

        assert!(AckType::EndMinute10.is_end_of_minute());
        assert!(!AckType::RevealEntry.is_end_of_minute());

        assert_eq!(AckType::EndMinute10.minute(), Some(10));
        assert_eq!(AckType::CommitEntry.minute(), None);
    }

    #[test]
    fn test_ack_equality_ignores_signature() {
        let hash = ShaHash::sha256(b"payload");
        let mut a = Ack::new(3, AckType::CommitEntry, Some(hash), 7);
        let b = Ack::new(3, AckType::CommitEntry, Some(hash), 7);
        assert_eq!(a, b);

        a.signature = Signature::from_bytes([1u8; 64]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_ack_inequality() {
        let hash = ShaHash::sha256(b"payload");
        let a = Ack::new(3, AckType::CommitEntry, Some(hash), 7);

        let mut b = a.clone();
        b.index = 4;
        assert_ne!(a, b);

        let mut c = a.clone();
        c.affirmation = Some(ShaHash::sha256(b"other"));
        assert_ne!(a, c);

        let mut d = a.clone();
        d.height = 8;
        assert_ne!(a, d);
    }

    #[test]
    fn test_signing_bytes_distinct_per_field() {
        let hash = ShaHash::sha256(b"payload");
        let a = Ack::new(3, AckType::CommitEntry, Some(hash), 7);
        let b = Ack::new(4, AckType::CommitEntry, Some(hash), 7);
        let c = Ack::new(3, AckType::RevealEntry, Some(hash), 7);
        assert_ne!(a.signing_bytes(), b.signing_bytes());
        assert_ne!(a.signing_bytes(), c.signing_bytes());
    }

    #[test]
    fn test_end_minute_signing_bytes_use_zero_hash() {
        let eom = Ack::new(9, AckType::EndMinute10, None, 7);
        let bytes = eom.signing_bytes();
        // domain || index || tag || zero hash || height
        assert_eq!(
            bytes.len(),
            crate::domains::ACK.len() + 4 + 1 + 32 + 4
        );
    }

    #[test]
    fn test_dir_block_sig_signing_bytes() {
        let sig1 = DirBlockSig::new(10, [1u8; 32]);
        let sig2 = DirBlockSig::new(11, [1u8; 32]);
        assert_ne!(sig1.signing_bytes(), sig2.signing_bytes());
    }
}
