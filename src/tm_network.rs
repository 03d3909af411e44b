use std::collections::VecDeque;

use crate::tm_bandwidth::BandwidthUnit;
use crate::tm_interface::{
    Behavior, Cycle, FeedbackHistory, FeedbackView, FileId, PeerId, Transaction,
};
use crate::tm_stats::Statistics;

// ============================================================================
// Peers
// ============================================================================

#[derive(Debug, Clone)]
pub struct Peer {
    pub behavior: Behavior,
    /// Probability of discarding an invalid file after receipt
    pub cleanup: f64,
    /// Probability of reporting truthful feedback
    pub honesty: f64,
    pub pre_trusted: bool,
    pub file_count: usize,
    pub upload: BandwidthUnit,
    pub download: BandwidthUnit,
}

impl Peer {
    pub fn new(
        behavior: Behavior,
        cleanup: f64,
        honesty: f64,
        pre_trusted: bool,
        band_max: usize,
        band_per: Cycle,
    ) -> Self {
        Self {
            behavior,
            cleanup,
            honesty,
            pre_trusted,
            file_count: 0,
            upload: BandwidthUnit::new(band_max, band_per),
            download: BandwidthUnit::new(band_max, band_per),
        }
    }
}

// ============================================================================
// Relations
// ============================================================================

/// One peer's view of another: two parallel feedback histories plus the
/// trust value last written by the trust algorithm.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Relation {
    pub global_pos: u32,
    pub global_neg: u32,
    pub honest_pos: u32,
    pub honest_neg: u32,
    pub trust: f64,
}

impl Relation {
    pub fn pos(&self, history: FeedbackHistory) -> u32 {
        match history {
            FeedbackHistory::Global => self.global_pos,
            FeedbackHistory::Honest => self.honest_pos,
        }
    }

    pub fn neg(&self, history: FeedbackHistory) -> u32 {
        match history {
            FeedbackHistory::Global => self.global_neg,
            FeedbackHistory::Honest => self.honest_neg,
        }
    }

    pub fn record_honest(&mut self, positive: bool) {
        if positive {
            self.honest_pos += 1;
        } else {
            self.honest_neg += 1;
        }
    }

    pub fn record_global(&mut self, positive: bool) {
        if positive {
            self.global_pos += 1;
        } else {
            self.global_neg += 1;
        }
    }
}

/// A single peer's copy of a file. Validity is per copy, not per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileCopy {
    pub owner: PeerId,
    pub valid: bool,
}

// ============================================================================
// Network State
// ============================================================================

/// Peers, the dense relation matrix, file libraries and the delay queue.
///
/// Indices are not range checked beyond slice indexing; an out-of-range peer
/// or file id is a programmer error.
pub struct Network {
    peers: Vec<Peer>,
    // row-major, relations[source * n + peer]
    relations: Vec<Relation>,
    files: Vec<Vec<FileCopy>>,
    delay_queue: VecDeque<Transaction>,
    pub stats: Statistics,
}

impl Network {
    pub fn new(peers: Vec<Peer>, num_files: usize) -> Self {
        let n = peers.len();
        Self {
            peers,
            relations: vec![Relation::default(); n * n],
            files: vec![Vec::new(); num_files],
            delay_queue: VecDeque::new(),
            stats: Statistics::new(),
        }
    }

    // ------------------------------------------------------------------------
    // peers
    // ------------------------------------------------------------------------

    pub fn num_peers(&self) -> usize {
        self.peers.len()
    }

    pub fn peer(&self, peer: PeerId) -> &Peer {
        &self.peers[peer]
    }

    pub fn peer_mut(&mut self, peer: PeerId) -> &mut Peer {
        &mut self.peers[peer]
    }

    pub fn set_peer(&mut self, id: PeerId, peer: Peer) {
        self.peers[id] = peer;
    }

    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    pub fn behavior(&self, peer: PeerId) -> Behavior {
        self.peers[peer].behavior
    }

    pub fn pre_trusted_count(&self) -> usize {
        self.peers.iter().filter(|p| p.pre_trusted).count()
    }

    // ------------------------------------------------------------------------
    // relations
    // ------------------------------------------------------------------------

    pub fn relation(&self, source: PeerId, peer: PeerId) -> &Relation {
        &self.relations[source * self.peers.len() + peer]
    }

    pub fn relation_mut(&mut self, source: PeerId, peer: PeerId) -> &mut Relation {
        let n = self.peers.len();
        &mut self.relations[source * n + peer]
    }

    /// Positive and negative counts of `source -> peer` under `view`
    pub fn visible_feedback(&self, view: &FeedbackView, source: PeerId, peer: PeerId) -> (u32, u32) {
        let history = view.history(source);
        let relation = self.relation(source, peer);
        (relation.pos(history), relation.neg(history))
    }

    pub fn trust(&self, source: PeerId, peer: PeerId) -> f64 {
        self.relation(source, peer).trust
    }

    pub fn set_trust(&mut self, source: PeerId, peer: PeerId, trust: f64) {
        self.relation_mut(source, peer).trust = trust;
    }

    // ------------------------------------------------------------------------
    // files
    // ------------------------------------------------------------------------

    pub fn num_files(&self) -> usize {
        self.files.len()
    }

    pub fn file_copies(&self, file: FileId) -> &[FileCopy] {
        &self.files[file]
    }

    pub fn file_owners(&self, file: FileId) -> usize {
        self.files[file].len()
    }

    /// Validity of the first copy of `file` held by `peer`
    pub fn file_copy_valid(&self, file: FileId, peer: PeerId) -> Option<bool> {
        self.files[file]
            .iter()
            .find(|copy| copy.owner == peer)
            .map(|copy| copy.valid)
    }

    pub fn has_file(&self, peer: PeerId, file: FileId) -> bool {
        self.files[file].iter().any(|copy| copy.owner == peer)
    }

    /// Number of files with at least one owner
    pub fn available_files(&self) -> usize {
        self.files.iter().filter(|copies| !copies.is_empty()).count()
    }

    pub fn add_file(&mut self, peer: PeerId, file: FileId, valid: bool) {
        self.files[file].push(FileCopy { owner: peer, valid });
        self.peers[peer].file_count += 1;
    }

    // ------------------------------------------------------------------------
    // delay queue
    // ------------------------------------------------------------------------

    pub fn enqueue(&mut self, transaction: Transaction) {
        self.delay_queue.push_back(transaction);
    }

    pub fn peek_queue(&self) -> Option<&Transaction> {
        self.delay_queue.front()
    }

    pub fn dequeue(&mut self) -> Option<Transaction> {
        self.delay_queue.pop_front()
    }

    pub fn queue_len(&self) -> usize {
        self.delay_queue.len()
    }
}
