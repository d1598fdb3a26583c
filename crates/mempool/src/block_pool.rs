//! Tag-addressed staging for blocks downloaded during catch-up.
//!
//! Heterogeneous block types pulled from peers share one map keyed by an
//! opaque domain tag (decimal height for directory blocks). The typed
//! accessors scan linearly; the catch-up window is tens of blocks, so a
//! secondary index would buy nothing.

use std::collections::HashMap;

use fedchain_types::{BlockPayload, Command, EntryBlockPayload, Message};

use crate::{MemPoolError, Result, MAX_BLK_POOL_SIZE};

/// Mapping from domain tag to downloaded block message.
pub struct BlockPool {
    blocks: HashMap<String, Message>,
    limit: usize,
}

impl BlockPool {
    /// Creates a pool with the protocol bound.
    pub fn new() -> Self {
        Self::with_limit(MAX_BLK_POOL_SIZE)
    }

    /// Creates a pool with an explicit bound.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            blocks: HashMap::new(),
            limit,
        }
    }

    /// Admits a block message under a free-form domain tag.
    pub fn admit(&mut self, msg: Message, tag: impl Into<String>) -> Result<()> {
        if self.blocks.len() >= self.limit {
            return Err(MemPoolError::BlockPoolFull(self.limit));
        }
        self.blocks.insert(tag.into(), msg);
        Ok(())
    }

    /// Looks up a block by its tag.
    pub fn fetch(&self, tag: &str) -> Option<&Message> {
        self.blocks.get(tag)
    }

    /// Removes a block by its tag, returning it if present.
    pub fn remove(&mut self, tag: &str) -> Option<Message> {
        self.blocks.remove(tag)
    }

    /// Returns true if any staged entry is a directory block.
    pub fn has_dir_block(&self) -> bool {
        self.blocks
            .values()
            .any(|msg| msg.command() == Command::DirBlock)
    }

    /// Directory block at the given height, if staged.
    ///
    /// Directory blocks are tagged by their decimal height, so this is a
    /// direct lookup rather than a scan.
    pub fn dir_block(&self, height: u32) -> Option<&BlockPayload> {
        match self.blocks.get(&height.to_string()) {
            Some(Message::DirBlock(block)) if block.height == height => Some(block),
            _ => None,
        }
    }

    /// First staged factoid block whose header carries the given height.
    pub fn factoid_block(&self, height: u32) -> Option<&BlockPayload> {
        self.blocks.values().find_map(|msg| match msg {
            Message::FBlock(block) if block.height == height => Some(block),
            _ => None,
        })
    }

    /// First staged entry credit block whose header carries the given height.
    pub fn entry_credit_block(&self, height: u32) -> Option<&BlockPayload> {
        self.blocks.values().find_map(|msg| match msg {
            Message::EcBlock(block) if block.height == height => Some(block),
            _ => None,
        })
    }

    /// First staged admin block whose header carries the given height.
    pub fn admin_block(&self, height: u32) -> Option<&BlockPayload> {
        self.blocks.values().find_map(|msg| match msg {
            Message::ABlock(block) if block.height == height => Some(block),
            _ => None,
        })
    }

    /// First staged entry block with the given chain-local sequence number.
    pub fn entry_block(&self, sequence: u32) -> Option<&EntryBlockPayload> {
        self.blocks.values().find_map(|msg| match msg {
            Message::EBlock(block) if block.sequence == sequence => Some(block),
            _ => None,
        })
    }

    /// Number of staged blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns true if no blocks are staged.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl Default for BlockPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admit_and_fetch() {
        let mut pool = BlockPool::new();
        let msg = Message::DirBlock(BlockPayload::new(7, b"dblock".to_vec()));
        pool.admit(msg.clone(), "7").unwrap();

        assert_eq!(pool.fetch("7"), Some(&msg));
        assert!(pool.fetch("8").is_none());
    }

    #[test]
    fn test_bound() {
        let mut pool = BlockPool::with_limit(1);
        pool.admit(Message::DirBlock(BlockPayload::new(1, b"a".to_vec())), "1")
            .unwrap();
        let err = pool
            .admit(Message::DirBlock(BlockPayload::new(2, b"b".to_vec())), "2")
            .unwrap_err();
        assert!(matches!(err, MemPoolError::BlockPoolFull(1)));
    }

    #[test]
    fn test_has_dir_block_mixed_commands() {
        let mut pool = BlockPool::new();
        pool.admit(Message::FBlock(BlockPayload::new(3, b"f".to_vec())), "f3")
            .unwrap();
        assert!(!pool.has_dir_block());

        pool.admit(Message::DirBlock(BlockPayload::new(3, b"d".to_vec())), "3")
            .unwrap();
        assert!(pool.has_dir_block());
    }

    #[test]
    fn test_typed_accessors_tolerate_mixed_entries() {
        let mut pool = BlockPool::new();
        pool.admit(Message::DirBlock(BlockPayload::new(4, b"d".to_vec())), "4")
            .unwrap();
        pool.admit(Message::FBlock(BlockPayload::new(4, b"f".to_vec())), "f4")
            .unwrap();
        pool.admit(Message::EcBlock(BlockPayload::new(4, b"ec".to_vec())), "ec4")
            .unwrap();
        pool.admit(Message::ABlock(BlockPayload::new(4, b"a".to_vec())), "a4")
            .unwrap();
        pool.admit(
            Message::EBlock(EntryBlockPayload::new(2, b"e".to_vec())),
            "e2",
        )
        .unwrap();

        assert_eq!(pool.dir_block(4).unwrap().height, 4);
        assert_eq!(pool.factoid_block(4).unwrap().height, 4);
        assert_eq!(pool.entry_credit_block(4).unwrap().height, 4);
        assert_eq!(pool.admin_block(4).unwrap().height, 4);
        assert_eq!(pool.entry_block(2).unwrap().sequence, 2);

        // no match at a different height
        assert!(pool.dir_block(5).is_none());
        assert!(pool.factoid_block(5).is_none());
        assert!(pool.entry_block(9).is_none());
    }

    #[test]
    fn test_remove() {
        let mut pool = BlockPool::new();
        pool.admit(Message::DirBlock(BlockPayload::new(7, b"d".to_vec())), "7")
            .unwrap();
        assert!(pool.remove("7").is_some());
        assert!(pool.remove("7").is_none());
        assert!(pool.is_empty());
    }
}
