//! Content-addressed staging for payload messages.
//!
//! Two maps share one bound discipline: the main pool holds admitted payload
//! messages keyed by content hash, and the orphan map holds payloads whose
//! prerequisite message has not arrived yet. Entries leave through cleanup
//! (the hash appeared in an assembled process list), through the stale relay
//! sweep, or by orphan promotion into the main pool.
//!
//! `ContentPool` is not internally synchronized; it is owned by the
//! coordinator behind its single reader-writer lock.

use std::collections::HashMap;

use fedchain_types::{Message, ShaHash};
use tracing::trace;

use crate::{MemPoolError, Result, MAX_ORPHAN_SIZE, MAX_TX_POOL_SIZE};

/// Mapping from message hash to message, with a separate bounded orphan map.
pub struct ContentPool {
    pool: HashMap<ShaHash, Message>,
    orphans: HashMap<ShaHash, Message>,
    max_pool: usize,
    max_orphans: usize,
}

impl ContentPool {
    /// Creates a pool with the protocol bounds.
    pub fn new() -> Self {
        Self::with_limits(MAX_TX_POOL_SIZE, MAX_ORPHAN_SIZE)
    }

    /// Creates a pool with explicit bounds.
    pub fn with_limits(max_pool: usize, max_orphans: usize) -> Self {
        Self {
            pool: HashMap::new(),
            orphans: HashMap::new(),
            max_pool,
            max_orphans,
        }
    }

    /// Admits a message keyed by its content digest.
    ///
    /// Re-admission of an already-present hash is a no-op, not an error.
    pub fn admit(&mut self, msg: Message) -> Result<()> {
        let hash = msg.digest();
        if self.pool.contains_key(&hash) {
            trace!(%hash, "message already admitted");
            return Ok(());
        }
        if self.pool.len() >= self.max_pool {
            return Err(MemPoolError::PoolFull(self.max_pool));
        }
        self.pool.insert(hash, msg);
        Ok(())
    }

    /// Admits a message into the orphan map, keyed by its content digest.
    pub fn admit_orphan(&mut self, msg: Message) -> Result<()> {
        let hash = msg.digest();
        if self.orphans.contains_key(&hash) {
            return Ok(());
        }
        if self.orphans.len() >= self.max_orphans {
            return Err(MemPoolError::OrphanPoolFull(self.max_orphans));
        }
        self.orphans.insert(hash, msg);
        Ok(())
    }

    /// Graduates an orphan into the main pool once its prerequisite arrived.
    ///
    /// Returns `Ok(false)` if no orphan with that hash exists. On a full main
    /// pool the orphan stays where it was.
    pub fn promote_orphan(&mut self, hash: &ShaHash) -> Result<bool> {
        let Some(msg) = self.orphans.remove(hash) else {
            return Ok(false);
        };
        if self.pool.contains_key(hash) {
            return Ok(true);
        }
        if self.pool.len() >= self.max_pool {
            self.orphans.insert(*hash, msg);
            return Err(MemPoolError::PoolFull(self.max_pool));
        }
        self.pool.insert(*hash, msg);
        Ok(true)
    }

    /// Returns true if the main pool holds the hash.
    pub fn have(&self, hash: &ShaHash) -> bool {
        self.pool.contains_key(hash)
    }

    /// Looks up a message in the main pool.
    pub fn get(&self, hash: &ShaHash) -> Option<&Message> {
        self.pool.get(hash)
    }

    /// Removes a message from the main pool, returning it if present.
    pub fn remove(&mut self, hash: &ShaHash) -> Option<Message> {
        self.pool.remove(hash)
    }

    /// Yields every `(hash, message)` pair from both maps and empties them.
    ///
    /// This is the only supported full iteration; it backs the stale relay
    /// sweep.
    pub fn drain_all(&mut self) -> Vec<(ShaHash, Message)> {
        let mut drained: Vec<_> = self.pool.drain().collect();
        drained.extend(self.orphans.drain());
        drained
    }

    /// Number of messages in the main pool.
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// Number of messages in the orphan map.
    pub fn orphan_len(&self) -> usize {
        self.orphans.len()
    }

    /// Returns true if both maps are empty.
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty() && self.orphans.is_empty()
    }
}

impl Default for ContentPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedchain_types::Payload;

    fn entry(body: &[u8]) -> Message {
        Message::CommitEntry(Payload::new(body.to_vec()))
    }

    #[test]
    fn test_admit_idempotent() {
        let mut pool = ContentPool::new();
        let msg = entry(b"p1");

        pool.admit(msg.clone()).unwrap();
        pool.admit(msg.clone()).unwrap();
        assert_eq!(pool.len(), 1);
        assert!(pool.have(&msg.digest()));
    }

    #[test]
    fn test_admit_full() {
        let mut pool = ContentPool::with_limits(2, 2);
        pool.admit(entry(b"a")).unwrap();
        pool.admit(entry(b"b")).unwrap();

        let err = pool.admit(entry(b"c")).unwrap_err();
        assert!(matches!(err, MemPoolError::PoolFull(2)));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_orphan_bound_separate() {
        let mut pool = ContentPool::with_limits(1, 1);
        pool.admit(entry(b"a")).unwrap();
        pool.admit_orphan(entry(b"b")).unwrap();

        let err = pool.admit_orphan(entry(b"c")).unwrap_err();
        assert!(matches!(err, MemPoolError::OrphanPoolFull(1)));
    }

    #[test]
    fn test_promote_orphan() {
        let mut pool = ContentPool::new();
        let msg = entry(b"orphaned");
        let hash = msg.digest();

        pool.admit_orphan(msg).unwrap();
        assert!(!pool.have(&hash));

        assert!(pool.promote_orphan(&hash).unwrap());
        assert!(pool.have(&hash));
        assert_eq!(pool.orphan_len(), 0);

        // absent hash is not an error
        assert!(!pool.promote_orphan(&ShaHash::sha256(b"nope")).unwrap());
    }

    #[test]
    fn test_promote_orphan_into_full_pool_keeps_orphan() {
        let mut pool = ContentPool::with_limits(1, 1);
        pool.admit(entry(b"a")).unwrap();
        let msg = entry(b"b");
        let hash = msg.digest();
        pool.admit_orphan(msg).unwrap();

        assert!(pool.promote_orphan(&hash).is_err());
        assert_eq!(pool.orphan_len(), 1);
    }

    #[test]
    fn test_drain_all_empties_both_maps() {
        let mut pool = ContentPool::new();
        pool.admit(entry(b"a")).unwrap();
        pool.admit(entry(b"b")).unwrap();
        pool.admit_orphan(entry(b"c")).unwrap();

        let drained = pool.drain_all();
        assert_eq!(drained.len(), 3);
        assert!(pool.is_empty());
        assert_eq!(pool.orphan_len(), 0);
    }

    #[test]
    fn test_remove() {
        let mut pool = ContentPool::new();
        let msg = entry(b"a");
        let hash = msg.digest();
        pool.admit(msg).unwrap();

        assert!(pool.remove(&hash).is_some());
        assert!(!pool.have(&hash));
        assert!(pool.remove(&hash).is_none());
    }
}
