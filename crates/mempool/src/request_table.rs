//! Tracking table for outstanding data pulls.
//!
//! A record is created on the first miss of a hash and its counter bumps on
//! every subsequent miss. The table never fires the network send itself;
//! returning the record lets the peer layer decide whether to actually emit,
//! typically only after several misses.

use std::collections::HashMap;

use fedchain_types::{GetData, InvKind, ShaHash};
use tracing::trace;

/// An outstanding pull request with its miss counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    /// The outbound pull request to emit
    pub msg: GetData,
    /// How many times the data has been found missing
    pub times_missed: u32,
    /// Latch set by the peer layer once the request was actually sent
    pub requested: bool,
}

/// Mapping from hash to outstanding pull request.
#[derive(Default)]
pub struct RequestTable {
    requests: HashMap<ShaHash, RequestRecord>,
}

impl RequestTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a miss for `hash`, creating the record on first miss.
    pub fn record_miss(&mut self, kind: InvKind, hash: ShaHash, height: u32) -> &RequestRecord {
        let record = self.requests.entry(hash).or_insert_with(|| {
            trace!(%hash, height, "new outstanding request");
            RequestRecord {
                msg: GetData::for_item(kind, hash, height),
                times_missed: 0,
                requested: false,
            }
        });
        record.times_missed += 1;
        record
    }

    /// Marks the record for `hash` as actually sent.
    pub fn mark_requested(&mut self, hash: &ShaHash) {
        if let Some(record) = self.requests.get_mut(hash) {
            record.requested = true;
        }
    }

    /// Deletes the record for `hash` if present; silent otherwise.
    pub fn clear(&mut self, hash: &ShaHash) {
        if self.requests.remove(hash).is_some() {
            trace!(%hash, "cleared outstanding request");
        }
    }

    /// Looks up the record for `hash`.
    pub fn get(&self, hash: &ShaHash) -> Option<&RequestRecord> {
        self.requests.get(hash)
    }

    /// Number of outstanding requests.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Returns true if no requests are outstanding.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}
