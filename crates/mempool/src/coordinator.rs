//! The pool coordinator - public, thread-safe face of the mempool.
//!
//! One reader-writer lock guards all coordinator state: the content pool,
//! the block pool, the ack vector, the directory block signature list, and
//! the request table. Read paths take the reader lock, mutating paths the
//! writer lock. No I/O happens while a lock is held; signing the returned
//! missing-piece requests is bounded CPU work, and the relay sweep releases
//! the lock before pushing into the outbound channel.
//!
//! Within one [`MemPool::ingest_ack`] call the slot write, payload lookup,
//! and missing-request build are atomic with respect to every other
//! coordinator operation. Across calls the only ordering is the slot index
//! the leader chose; arrival order is irrelevant.

use std::sync::Arc;
use std::time::Instant;

use fedchain_crypto::PrivateKey;
use fedchain_types::{
    Ack, AckType, BlockPayload, DirBlockSig, EntryBlockPayload, InvKind, Message, MissingRequest,
    NodeId, ShaHash,
};
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, trace, warn};

use crate::ack_vector::{AckVector, SlotOutcome};
use crate::block_pool::BlockPool;
use crate::content_pool::ContentPool;
use crate::request_table::{RequestRecord, RequestTable};
use crate::{MemPoolError, Result};

/// Downstream consumer of assembled process lists.
///
/// The sole egress of [`MemPool::assemble_follower_process_list`].
/// Implementations must not block: assembly invokes this under the pool's
/// read lock.
pub trait ProcessListManager: Send + Sync {
    /// Receives one slot of the follower process list, in slot order.
    ///
    /// `msg` and `hash` are absent for end-of-minute markers.
    fn add_to_followers_process_list(
        &self,
        msg: Option<Message>,
        ack: &Ack,
        hash: Option<ShaHash>,
    );
}

/// Everything the coordinator needs from the surrounding node.
///
/// Threaded through the constructor explicitly; the coordinator keeps no
/// ambient process-wide state.
pub struct MemPoolContext {
    /// Identity of this server, stamped on missing-piece requests
    pub node_id: NodeId,
    /// Server key used to sign missing-piece requests
    pub signer: PrivateKey,
    /// Outbound channel of the peer layer, fed by the stale relay sweep
    pub outbound: UnboundedSender<Message>,
    /// Consumer of assembled process lists
    pub process_list: Arc<dyn ProcessListManager>,
}

/// Summary of one emitted process list slot, kept for the cleanup pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessListItem {
    /// Slot index the item occupied
    pub index: u32,
    /// Content hash of the paired payload, absent for minute markers
    pub msg_hash: Option<ShaHash>,
}

/// Point-in-time size counters for every pool.
#[derive(Debug, Clone, Copy)]
pub struct MemPoolStats {
    /// Messages in the content pool
    pub pool_size: usize,
    /// Messages in the orphan map
    pub orphan_size: usize,
    /// Blocks staged for catch-up
    pub block_pool_size: usize,
    /// Addressable slots in the ack vector
    pub ack_slots: usize,
    /// Directory block signatures collected
    pub dir_block_sigs: usize,
    /// Outstanding pull requests
    pub outstanding_requests: usize,
    /// Last time any pool was mutated
    pub last_updated: Instant,
}

/// All coordinator state behind the single lock.
struct PoolState {
    content: ContentPool,
    blocks: BlockPool,
    acks: AckVector,
    dir_block_sigs: Vec<DirBlockSig>,
    requests: RequestTable,
    last_updated: Instant,
}

/// The message mempool and ack-ordered process list assembler.
///
/// Many peer-handler threads call the admit and ingest paths concurrently;
/// janitor timers drive the cleanup and relay sweeps; the block builder
/// thread invokes assembly. All of it serializes on one internal lock.
pub struct MemPool {
    ctx: MemPoolContext,
    state: RwLock<PoolState>,
}

impl MemPool {
    /// Creates an empty mempool with the protocol bounds.
    pub fn new(ctx: MemPoolContext) -> Self {
        Self {
            ctx,
            state: RwLock::new(PoolState {
                content: ContentPool::new(),
                blocks: BlockPool::new(),
                acks: AckVector::new(),
                dir_block_sigs: Vec::with_capacity(32),
                requests: RequestTable::new(),
                last_updated: Instant::now(),
            }),
        }
    }

    // --- content pool -----------------------------------------------------

    /// Admits a payload message, keyed by its content digest.
    ///
    /// Idempotent on identical digests. Admission also clears any
    /// outstanding pull request for the hash, ending that record's life.
    pub fn admit(&self, msg: Message) -> Result<()> {
        let hash = msg.digest();
        let mut state = self.state.write();
        state.content.admit(msg)?;
        state.requests.clear(&hash);
        state.last_updated = Instant::now();
        trace!(%hash, "admitted message");
        Ok(())
    }

    /// Admits a payload whose prerequisite has not arrived yet.
    pub fn admit_orphan(&self, msg: Message) -> Result<()> {
        let hash = msg.digest();
        let mut state = self.state.write();
        state.content.admit_orphan(msg)?;
        state.last_updated = Instant::now();
        trace!(%hash, "admitted orphan");
        Ok(())
    }

    /// Graduates an orphan into the main pool once its prerequisite arrived.
    pub fn promote_orphan(&self, hash: &ShaHash) -> Result<bool> {
        let mut state = self.state.write();
        let promoted = state.content.promote_orphan(hash)?;
        if promoted {
            state.requests.clear(hash);
            state.last_updated = Instant::now();
            debug!(%hash, "promoted orphan into main pool");
        }
        Ok(promoted)
    }

    /// Returns true if the content pool holds the hash.
    pub fn have(&self, hash: &ShaHash) -> bool {
        self.state.read().content.have(hash)
    }

    /// Looks up a message in the content pool.
    pub fn get(&self, hash: &ShaHash) -> Option<Message> {
        self.state.read().content.get(hash).cloned()
    }

    /// Removes a message from the content pool, returning it if present.
    pub fn remove(&self, hash: &ShaHash) -> Option<Message> {
        let mut state = self.state.write();
        let removed = state.content.remove(hash);
        if removed.is_some() {
            state.last_updated = Instant::now();
        }
        removed
    }

    // --- block pool -------------------------------------------------------

    /// Stages a block downloaded from a peer under a free-form domain tag.
    pub fn admit_block(&self, msg: Message, tag: impl Into<String>) -> Result<()> {
        let mut state = self.state.write();
        state.blocks.admit(msg, tag)?;
        state.last_updated = Instant::now();
        Ok(())
    }

    /// Looks up a staged block by its tag.
    pub fn block(&self, tag: &str) -> Option<Message> {
        self.state.read().blocks.fetch(tag).cloned()
    }

    /// Deletes a staged block by its tag.
    pub fn delete_block(&self, tag: &str) -> Option<Message> {
        let mut state = self.state.write();
        let removed = state.blocks.remove(tag);
        if removed.is_some() {
            state.last_updated = Instant::now();
        }
        removed
    }

    /// Returns true if any staged entry is a directory block.
    pub fn has_dir_block(&self) -> bool {
        self.state.read().blocks.has_dir_block()
    }

    /// Staged directory block at the given height.
    pub fn dir_block(&self, height: u32) -> Option<BlockPayload> {
        self.state.read().blocks.dir_block(height).cloned()
    }

    /// Staged factoid block whose header carries the given height.
    pub fn factoid_block(&self, height: u32) -> Option<BlockPayload> {
        self.state.read().blocks.factoid_block(height).cloned()
    }

    /// Staged entry credit block whose header carries the given height.
    pub fn entry_credit_block(&self, height: u32) -> Option<BlockPayload> {
        self.state.read().blocks.entry_credit_block(height).cloned()
    }

    /// Staged admin block whose header carries the given height.
    pub fn admin_block(&self, height: u32) -> Option<BlockPayload> {
        self.state.read().blocks.admin_block(height).cloned()
    }

    /// Staged entry block with the given chain-local sequence number.
    pub fn entry_block(&self, sequence: u32) -> Option<EntryBlockPayload> {
        self.state.read().blocks.entry_block(sequence).cloned()
    }

    // --- ack ingestion ----------------------------------------------------

    /// Ingests a validated ack, pairing its slot with the referenced payload.
    ///
    /// Returns `Ok(None)` when nothing further is needed: minute markers,
    /// payload-bearing acks whose payload is already pooled, and exact
    /// duplicates. Returns a signed [`MissingRequest`] when the affirmation
    /// names a hash the content pool does not hold; the ack stays in its
    /// slot either way. A different ack already occupying the slot is a
    /// protocol fault and is rejected without overwriting.
    pub fn ingest_ack(&self, ack: Ack) -> Result<Option<MissingRequest>> {
        let index = ack.index;
        let height = ack.height;
        let ack_type = ack.ack_type;
        let affirmation = ack.affirmation;

        let mut state = self.state.write();
        match state.acks.insert(ack) {
            SlotOutcome::Duplicate => {
                debug!(index, "duplicate ack, ignoring");
                return Ok(None);
            }
            SlotOutcome::Conflict => {
                warn!(index, "conflicting ack for occupied slot, rejecting");
                return Err(MemPoolError::ConflictingAck { index });
            }
            SlotOutcome::Inserted => {}
        }
        state.last_updated = Instant::now();

        if !ack_type.references_payload() {
            return Ok(None);
        }
        let Some(hash) = affirmation else {
            warn!(index, %ack_type, "payload-bearing ack carries no affirmation");
            return Ok(None);
        };
        if state.content.have(&hash) {
            return Ok(None);
        }

        trace!(index, %hash, "ack references unknown payload, requesting it");
        let mut request =
            MissingRequest::new(height, index, Some(ack_type), false, hash, self.ctx.node_id);
        request.signature = self.ctx.signer.sign(&request.signing_bytes());
        Ok(Some(request))
    }

    /// The ack occupying a slot, or `None` for gaps and out-of-range indices.
    pub fn ack(&self, index: u32) -> Option<Ack> {
        self.state.read().acks.slot(index).cloned()
    }

    /// Reinitializes the ack vector to the initial window shape.
    pub fn reset_ack_pool(&self) {
        debug!("resetting ack pool");
        let mut state = self.state.write();
        state.acks.reset();
        state.last_updated = Instant::now();
    }

    // --- missing-ack scan -------------------------------------------------

    /// Scans backwards from an end-of-minute ack for empty slots.
    ///
    /// Walks from `eom.index - 1` down to slot zero, stopping at the
    /// previous minute boundary, and returns one signed request per gap in
    /// the order discovered (high index first).
    pub fn missing_ack_scan(&self, eom: &Ack) -> Vec<MissingRequest> {
        let mut missing = Vec::new();
        if eom.index == 0 {
            return missing;
        }

        let state = self.state.read();
        for i in (0..eom.index).rev() {
            match state.acks.slot(i) {
                None => {
                    debug!(index = i, "missing ack in current window");
                    let mut request = MissingRequest::new(
                        eom.height,
                        i,
                        None,
                        true,
                        ShaHash::ZERO,
                        self.ctx.node_id,
                    );
                    request.signature = self.ctx.signer.sign(&request.signing_bytes());
                    missing.push(request);
                }
                // reached the previous minute boundary
                Some(ack) if ack.is_end_of_minute() => break,
                Some(_) => {}
            }
        }
        missing
    }

    // --- follower process list assembly -----------------------------------

    /// Assembles the slot-ordered process list for the closing window.
    ///
    /// `ack` must be the `EndMinute10` marker already occupying its slot;
    /// anything else returns [`MemPoolError::NotTerminal`]. Missing acks and
    /// missing payloads are logged and skipped: the window is closing and a
    /// recorded gap no longer blocks assembly. Emits each slot to the
    /// process list manager and returns the item summaries for the cleanup
    /// pass.
    pub fn assemble_follower_process_list(&self, ack: &Ack) -> Result<Vec<ProcessListItem>> {
        let state = self.state.read();

        if ack.ack_type != AckType::EndMinute10 {
            return Err(MemPoolError::NotTerminal);
        }
        match state.acks.slot(ack.index) {
            Some(incumbent) if incumbent == ack => {}
            _ => return Err(MemPoolError::NotTerminal),
        }

        let mut items = Vec::new();
        for i in 0..state.acks.len() as u32 {
            let Some(slot_ack) = state.acks.slot(i) else {
                warn!(index = i, "missing ack at assembly, skipping slot");
                continue;
            };
            let payload = slot_ack
                .affirmation
                .as_ref()
                .and_then(|hash| state.content.get(hash));
            if payload.is_none() && !slot_ack.is_end_of_minute() {
                warn!(index = i, "missing payload at assembly, skipping slot");
                continue;
            }
            let hash = if payload.is_some() {
                slot_ack.affirmation
            } else {
                None
            };
            self.ctx
                .process_list
                .add_to_followers_process_list(payload.cloned(), slot_ack, hash);
            items.push(ProcessListItem { index: i, msg_hash: hash });
            if slot_ack.ack_type == AckType::EndMinute10 {
                break;
            }
        }
        Ok(items)
    }

    // --- directory block signatures ---------------------------------------

    /// Appends a directory block signature to the collection list.
    pub fn add_dir_block_sig(&self, sig: DirBlockSig) {
        let mut state = self.state.write();
        state.dir_block_sigs.push(sig);
        state.last_updated = Instant::now();
    }

    /// Number of directory block signatures collected.
    pub fn dir_block_sig_count(&self) -> usize {
        self.state.read().dir_block_sigs.len()
    }

    /// Snapshot of the collected directory block signatures, in arrival order.
    pub fn dir_block_sigs(&self) -> Vec<DirBlockSig> {
        self.state.read().dir_block_sigs.clone()
    }

    /// Removes every signature with `height <= up_to`, preserving the
    /// relative order of survivors.
    pub fn reset_dir_block_sigs_up_to(&self, up_to: u32) {
        let mut state = self.state.write();
        let before = state.dir_block_sigs.len();
        state.dir_block_sigs.retain(|sig| sig.height > up_to);
        state.last_updated = Instant::now();
        debug!(
            height = up_to,
            removed = before - state.dir_block_sigs.len(),
            "reset directory block signature pool"
        );
    }

    // --- request table ----------------------------------------------------

    /// Records a miss for `hash`, returning the pull request to maybe emit.
    ///
    /// The peer layer decides whether to actually send, typically only after
    /// several misses; the returned record carries the counter.
    pub fn request_missing(&self, kind: InvKind, hash: ShaHash, height: u32) -> RequestRecord {
        let mut state = self.state.write();
        let record = state.requests.record_miss(kind, hash, height).clone();
        state.last_updated = Instant::now();
        debug!(%hash, times_missed = record.times_missed, "recorded missing data");
        record
    }

    /// Marks the outstanding request for `hash` as actually sent.
    pub fn mark_requested(&self, hash: &ShaHash) {
        let mut state = self.state.write();
        state.requests.mark_requested(hash);
        state.last_updated = Instant::now();
    }

    /// Drops the outstanding request for `hash`; silent if absent.
    pub fn clear_request(&self, hash: &ShaHash) {
        let mut state = self.state.write();
        state.requests.clear(hash);
        state.last_updated = Instant::now();
    }

    // --- housekeeping -----------------------------------------------------

    /// Deletes every process-listed payload hash from the content pool.
    ///
    /// Invoked after blocks are built from the assembled list. Leaves the
    /// block pool and ack vector untouched.
    pub fn cleanup_after_build(&self, items: &[ProcessListItem]) {
        let mut state = self.state.write();
        for item in items {
            if let Some(hash) = &item.msg_hash {
                if state.content.remove(hash).is_some() {
                    trace!(%hash, "cleanup removed process-listed message");
                }
            }
        }
        state.last_updated = Instant::now();
    }

    /// Drains the content and orphan pools into the outbound channel.
    ///
    /// The lock is released before the sends; every drained message is
    /// offered to the channel exactly once.
    pub fn relay_stale(&self) {
        let drained = {
            let mut state = self.state.write();
            state.last_updated = Instant::now();
            state.content.drain_all()
        };

        for (hash, msg) in drained {
            trace!(%hash, "relaying stale message");
            if self.ctx.outbound.send(msg).is_err() {
                warn!("outbound channel closed, dropping remaining stale messages");
                break;
            }
        }
    }

    /// Point-in-time size counters for every pool.
    pub fn stats(&self) -> MemPoolStats {
        let state = self.state.read();
        MemPoolStats {
            pool_size: state.content.len(),
            orphan_size: state.content.orphan_len(),
            block_pool_size: state.blocks.len(),
            ack_slots: state.acks.len(),
            dir_block_sigs: state.dir_block_sigs.len(),
            outstanding_requests: state.requests.len(),
            last_updated: state.last_updated,
        }
    }
}

/// Recording process list sink for tests.
///
/// Collects every emitted `(msg, ack, hash)` triple in arrival order.
#[derive(Default)]
pub struct MockProcessList {
    entries: Mutex<Vec<(Option<Message>, Ack, Option<ShaHash>)>>,
}

impl MockProcessList {
    /// Creates an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// The triples received so far, in arrival order.
    pub fn entries(&self) -> Vec<(Option<Message>, Ack, Option<ShaHash>)> {
        self.entries.lock().clone()
    }

    /// Number of triples received.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing was received yet.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl ProcessListManager for MockProcessList {
    fn add_to_followers_process_list(
        &self,
        msg: Option<Message>,
        ack: &Ack,
        hash: Option<ShaHash>,
    ) {
        self.entries.lock().push((msg, ack.clone(), hash));
    }
}
