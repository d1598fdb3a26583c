//! Protocol messages and the closed command set.
//!
//! Every peer-originated message is one variant of [`Message`]; the matching
//! [`Command`] tag is what the pools route on. Payload-bearing variants
//! compute their SHA-256 digest once at construction, so the content hash is
//! obtainable without re-hashing.

use crate::ack::{Ack, DirBlockSig};
use crate::{domains, ShaHash};
use fedchain_crypto::Signature;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte identifier of a federated server.
pub type NodeId = [u8; 32];

/// The closed set of protocol command tags.
///
/// Matching on this enum is exhaustive; adding a message kind is a
/// compile-time event across every routing site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Commit a new chain
    CommitChain,
    /// Reveal a committed chain
    RevealChain,
    /// Commit a new entry
    CommitEntry,
    /// Reveal a committed entry
    RevealEntry,
    /// Factoid transaction
    FactoidTx,
    /// Leader acknowledgment
    Ack,
    /// End-of-minute marker
    Eom,
    /// Directory block signature
    DirBlockSig,
    /// Directory block download
    DirBlock,
    /// Factoid block download
    FBlock,
    /// Entry credit block download
    EcBlock,
    /// Admin block download
    ABlock,
    /// Entry block download
    EBlock,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Opaque payload bytes with their content digest computed once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    bytes: Vec<u8>,
    digest: ShaHash,
}

impl Payload {
    /// Wraps raw payload bytes, computing their SHA-256 digest.
    pub fn new(bytes: Vec<u8>) -> Self {
        let digest = ShaHash::sha256(&bytes);
        Self { bytes, digest }
    }

    /// The raw payload bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The content digest, computed at construction.
    pub fn digest(&self) -> ShaHash {
        self.digest
    }
}

/// A downloaded block together with the height its header carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockPayload {
    /// Directory block height from the block header
    pub height: u32,
    /// Serialized block body
    pub payload: Payload,
}

impl BlockPayload {
    /// Wraps a serialized block and its header height.
    pub fn new(height: u32, bytes: Vec<u8>) -> Self {
        Self {
            height,
            payload: Payload::new(bytes),
        }
    }
}

/// A downloaded entry block, identified by its chain-local sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryBlockPayload {
    /// Sequence number from the entry block header
    pub sequence: u32,
    /// Serialized block body
    pub payload: Payload,
}

impl EntryBlockPayload {
    /// Wraps a serialized entry block and its header sequence number.
    pub fn new(sequence: u32, bytes: Vec<u8>) -> Self {
        Self {
            sequence,
            payload: Payload::new(bytes),
        }
    }
}

/// An end-of-minute marker broadcast by the leader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EomMarker {
    /// The minute being closed (1 through 10)
    pub minute: u8,
    /// Directory block height of the window
    pub height: u32,
}

/// A decoded protocol message.
///
/// One variant per [`Command`]; the tag-switch at every routing site is a
/// compile-time exhaustiveness obligation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// Commit a new chain
    CommitChain(Payload),
    /// Reveal a committed chain
    RevealChain(Payload),
    /// Commit a new entry
    CommitEntry(Payload),
    /// Reveal a committed entry
    RevealEntry(Payload),
    /// Factoid transaction
    FactoidTx(Payload),
    /// Leader acknowledgment
    Ack(Ack),
    /// End-of-minute marker
    Eom(EomMarker),
    /// Directory block signature
    DirBlockSig(DirBlockSig),
    /// Directory block download
    DirBlock(BlockPayload),
    /// Factoid block download
    FBlock(BlockPayload),
    /// Entry credit block download
    EcBlock(BlockPayload),
    /// Admin block download
    ABlock(BlockPayload),
    /// Entry block download
    EBlock(EntryBlockPayload),
}

impl Message {
    /// The command tag of this message.
    pub fn command(&self) -> Command {
        match self {
            Message::CommitChain(_) => Command::CommitChain,
            Message::RevealChain(_) => Command::RevealChain,
            Message::CommitEntry(_) => Command::CommitEntry,
            Message::RevealEntry(_) => Command::RevealEntry,
            Message::FactoidTx(_) => Command::FactoidTx,
            Message::Ack(_) => Command::Ack,
            Message::Eom(_) => Command::Eom,
            Message::DirBlockSig(_) => Command::DirBlockSig,
            Message::DirBlock(_) => Command::DirBlock,
            Message::FBlock(_) => Command::FBlock,
            Message::EcBlock(_) => Command::EcBlock,
            Message::ABlock(_) => Command::ABlock,
            Message::EBlock(_) => Command::EBlock,
        }
    }

    /// The content digest of this message.
    ///
    /// Payload-bearing variants return the digest cached at construction;
    /// control messages hash their signing bytes. Total for every variant.
    pub fn digest(&self) -> ShaHash {
        match self {
            Message::CommitChain(p)
            | Message::RevealChain(p)
            | Message::CommitEntry(p)
            | Message::RevealEntry(p)
            | Message::FactoidTx(p) => p.digest(),
            Message::Ack(ack) => ShaHash::sha256(&ack.signing_bytes()),
            Message::Eom(eom) => ShaHash::sha256_concat(&[
                b"FEDCHAIN_EOM_V1",
                &[eom.minute],
                &eom.height.to_le_bytes(),
            ]),
            Message::DirBlockSig(sig) => ShaHash::sha256(&sig.signing_bytes()),
            Message::DirBlock(b)
            | Message::FBlock(b)
            | Message::EcBlock(b)
            | Message::ABlock(b) => b.payload.digest(),
            Message::EBlock(b) => b.payload.digest(),
        }
    }
}

/// Kind of data named by an inventory vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvKind {
    /// A factoid transaction
    Tx,
    /// An entry payload (commit or reveal)
    Entry,
    /// A chain payload (commit or reveal)
    Chain,
    /// A directory block
    DirBlock,
    /// An entry block
    EntryBlock,
}

/// One item of an inventory pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvVect {
    /// What kind of data is being requested
    pub kind: InvKind,
    /// Content hash of the requested data
    pub hash: ShaHash,
    /// Directory block height the data belongs to
    pub height: u32,
}

/// An outbound pull request for data a peer holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetData {
    /// The inventory items being requested
    pub items: Vec<InvVect>,
}

impl GetData {
    /// Builds a single-item pull request.
    pub fn for_item(kind: InvKind, hash: ShaHash, height: u32) -> Self {
        Self {
            items: vec![InvVect { kind, hash, height }],
        }
    }
}

/// A signed request for a missing payload or a missing ack.
///
/// Emitted by the ack-ingest path when an affirmation names an unknown hash
/// (`is_ack_request == false`) and by the missing-ack scan when a slot is
/// empty (`is_ack_request == true`, with [`ShaHash::ZERO`] as the hash and
/// no ack type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingRequest {
    /// Directory block height of the window
    pub height: u32,
    /// Slot index the request concerns
    pub index: u32,
    /// Ack type of the slot, when known
    pub ack_type: Option<crate::AckType>,
    /// True when asking for an ack rather than a payload
    pub is_ack_request: bool,
    /// Hash of the missing payload, or zero for ack requests
    pub hash: ShaHash,
    /// Identity of the requesting server
    pub node_id: NodeId,
    /// Signature over [`MissingRequest::signing_bytes`]
    pub signature: Signature,
}

impl MissingRequest {
    /// Creates a new unsigned missing-piece request.
    pub fn new(
        height: u32,
        index: u32,
        ack_type: Option<crate::AckType>,
        is_ack_request: bool,
        hash: ShaHash,
        node_id: NodeId,
    ) -> Self {
        Self {
            height,
            index,
            ack_type,
            is_ack_request,
            hash,
            node_id,
            signature: Signature::default(),
        }
    }

    /// Returns the bytes the requesting server signs.
    pub fn signing_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(domains::MISSING.len() + 74);
        bytes.extend(domains::MISSING);
        bytes.extend(&self.height.to_le_bytes());
        bytes.extend(&self.index.to_le_bytes());
        // 255 marks "type unknown" on ack requests
        bytes.push(match self.ack_type {
            Some(t) => t as u8,
            None => 255,
        });
        bytes.push(self.is_ack_request as u8);
        bytes.extend(self.hash.as_bytes());
        bytes.extend(&self.node_id);
        bytes
    }
}
