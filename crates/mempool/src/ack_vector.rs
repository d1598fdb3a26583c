//! Dense, slot-indexed ack log for the current minute window.
//!
//! The vector is addressable at every index below its length; gaps are
//! `None`, never an index shift. Length and capacity follow the protocol's
//! growth policy rather than the allocator's, so both are tracked explicitly.

use fedchain_types::Ack;
use tracing::debug;

use crate::{ACK_POOL_GROWTH_STEP, ACK_POOL_INITIAL_CAP, ACK_POOL_INITIAL_LEN};

/// Result of placing an ack into its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotOutcome {
    /// The slot was empty and now holds the ack
    Inserted,
    /// The slot already holds an equal ack
    Duplicate,
    /// The slot holds a different ack with the same index
    Conflict,
}

/// Slot-indexed vector of ack-or-absent.
pub struct AckVector {
    slots: Vec<Option<Ack>>,
    cap: usize,
}

impl AckVector {
    /// Creates a vector at the initial protocol shape.
    pub fn new() -> Self {
        Self {
            slots: vec![None; ACK_POOL_INITIAL_LEN],
            cap: ACK_POOL_INITIAL_CAP,
        }
    }

    /// Discards all slots and returns to the initial shape.
    pub fn reset(&mut self) {
        self.slots = vec![None; ACK_POOL_INITIAL_LEN];
        self.cap = ACK_POOL_INITIAL_CAP;
    }

    /// Current addressable length.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the vector has no addressable slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Current capacity under the growth policy.
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// The ack at a slot, or `None` for gaps and out-of-range indices.
    pub fn slot(&self, index: u32) -> Option<&Ack> {
        self.slots.get(index as usize).and_then(|s| s.as_ref())
    }

    /// Places an ack in its slot, resetting the window on index zero and
    /// growing the vector when the insert lands past the end.
    ///
    /// An equal incumbent yields [`SlotOutcome::Duplicate`]; a different
    /// incumbent yields [`SlotOutcome::Conflict`] and the slot is left
    /// untouched.
    pub fn insert(&mut self, ack: Ack) -> SlotOutcome {
        let index = ack.index as usize;

        if index == 0 {
            debug!("ack at index 0, resetting the minute window");
            self.reset();
        } else {
            self.make_room(index);
        }

        match &self.slots[index] {
            Some(incumbent) if *incumbent == ack => return SlotOutcome::Duplicate,
            Some(_) => return SlotOutcome::Conflict,
            None => {}
        }
        self.slots[index] = Some(ack);
        SlotOutcome::Inserted
    }

    /// Applies the growth policy so that `index` is addressable.
    ///
    /// Reaching capacity doubles both length and capacity; landing at or past
    /// the current length otherwise grows the length by the fixed step.
    fn make_room(&mut self, index: usize) {
        if index == self.cap {
            let doubled = index * 2;
            debug!(len = doubled, "ack vector at capacity, doubling");
            self.slots.resize(doubled, None);
            self.cap = doubled;
        } else if index >= self.slots.len() {
            let grown = index + ACK_POOL_GROWTH_STEP;
            debug!(len = grown, "growing ack vector");
            self.slots.resize(grown, None);
            if grown > self.cap {
                self.cap = grown;
            }
        }
    }
}

impl Default for AckVector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedchain_types::{AckType, ShaHash};

    fn ack(index: u32) -> Ack {
        Ack::new(
            index,
            AckType::CommitEntry,
            Some(ShaHash::sha256(&index.to_le_bytes())),
            1,
        )
    }

    #[test]
    fn test_initial_shape() {
        let v = AckVector::new();
        assert_eq!(v.len(), 100);
        assert_eq!(v.capacity(), 200);
        assert!(v.slot(0).is_none());
        assert!(v.slot(99).is_none());
    }

    #[test]
    fn test_growth_boundary_table() {
        // inserts at 99, 100, 149, 150, 199, 200 from the initial shape
        let mut v = AckVector::new();

        assert_eq!(v.insert(ack(99)), SlotOutcome::Inserted);
        assert_eq!(v.len(), 100);

        assert_eq!(v.insert(ack(100)), SlotOutcome::Inserted);
        assert_eq!(v.len(), 150);
        assert_eq!(v.capacity(), 200);

        assert_eq!(v.insert(ack(149)), SlotOutcome::Inserted);
        assert_eq!(v.len(), 150);

        assert_eq!(v.insert(ack(150)), SlotOutcome::Inserted);
        assert_eq!(v.len(), 200);
        assert_eq!(v.capacity(), 200);

        assert_eq!(v.insert(ack(199)), SlotOutcome::Inserted);
        assert_eq!(v.len(), 200);

        assert_eq!(v.insert(ack(200)), SlotOutcome::Inserted);
        assert_eq!(v.len(), 400);
        assert_eq!(v.capacity(), 400);
    }

    #[test]
    fn test_insert_far_past_end_is_total() {
        let mut v = AckVector::new();
        assert_eq!(v.insert(ack(170)), SlotOutcome::Inserted);
        assert_eq!(v.len(), 220);
        assert!(v.slot(170).is_some());
        assert!(v.slot(171).is_none());
    }

    #[test]
    fn test_duplicate_and_conflict() {
        let mut v = AckVector::new();
        let a = ack(3);
        assert_eq!(v.insert(a.clone()), SlotOutcome::Inserted);
        assert_eq!(v.insert(a.clone()), SlotOutcome::Duplicate);

        let mut other = a.clone();
        other.affirmation = Some(ShaHash::sha256(b"different"));
        assert_eq!(v.insert(other), SlotOutcome::Conflict);
        // incumbent untouched
        assert_eq!(v.slot(3), Some(&a));
    }

    #[test]
    fn test_index_zero_resets_after_growth() {
        let mut v = AckVector::new();
        for i in [1u32, 2, 3, 200].iter().copied() {
            v.insert(ack(i));
        }
        assert_eq!(v.capacity(), 400);

        v.insert(ack(0));
        assert_eq!(v.len(), 100);
        assert_eq!(v.capacity(), 200);
        assert!(v.slot(0).is_some());
        for i in 1..100 {
            assert!(v.slot(i).is_none());
        }
    }

    #[test]
    fn test_explicit_reset() {
        let mut v = AckVector::new();
        v.insert(ack(5));
        v.reset();
        assert!(v.slot(5).is_none());
        assert_eq!(v.len(), 100);
        assert_eq!(v.capacity(), 200);
    }
}
