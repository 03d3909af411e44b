use crate::tm_eigen::{EigenTrust, EigenTrustIncremental};
use crate::tm_interface::{Cycle, FeedbackView, PeerId, Transaction};
use crate::tm_network::Network;
use crate::tm_peertrust::{NoneTrust, PeerTrust, ThresholdTrust};
use crate::tm_tnasl::TnaSl;

/// Contract shared by every trust algorithm.
///
/// `update` folds a committed transaction (or a view change) into the
/// algorithm's derived state; `compute_trust` refreshes the trust values
/// `peer` holds toward everyone else in the network's relation store.
/// Both read feedback counts through `view`.
pub trait TrustAlg {
    fn name(&self) -> &'static str;

    /// Extension given to report files produced with this algorithm
    fn file_extension(&self) -> &'static str;

    fn update(&mut self, network: &Network, view: &FeedbackView, transaction: &Transaction);

    fn compute_trust(&mut self, network: &mut Network, view: &FeedbackView, peer: PeerId, cycle: Cycle);
}

// ============================================================================
// Algorithm Selection
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    None,
    EigenTrust,
    EigenTrustIncremental,
    TnaSl,
    MyTrust,
    PeerTrust,
    ThresholdTrust,
}

impl Algorithm {
    pub const ALL: [Algorithm; 7] = [
        Algorithm::None,
        Algorithm::EigenTrust,
        Algorithm::EigenTrustIncremental,
        Algorithm::TnaSl,
        Algorithm::MyTrust,
        Algorithm::PeerTrust,
        Algorithm::ThresholdTrust,
    ];

    /// Case-insensitive lookup; unrecognised names select `None`
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "eigen" | "eigentrust" => Algorithm::EigenTrust,
            "et_inc" | "etinc" => Algorithm::EigenTrustIncremental,
            "tna_sl" | "tnasl" => Algorithm::TnaSl,
            "mytrust" => Algorithm::MyTrust,
            "peertrust" => Algorithm::PeerTrust,
            "thresholdt" => Algorithm::ThresholdTrust,
            _ => Algorithm::None,
        }
    }

    /// Name accepted by [`Algorithm::from_name`], also used as file extension
    pub fn short_name(&self) -> &'static str {
        match self {
            Algorithm::None => "none",
            Algorithm::EigenTrust => "eigen",
            Algorithm::EigenTrustIncremental => "etinc",
            Algorithm::TnaSl => "tnasl",
            Algorithm::MyTrust => "mytrust",
            Algorithm::PeerTrust => "peertrust",
            Algorithm::ThresholdTrust => "thresholdt",
        }
    }

    /// Construct the algorithm over `network`. Construction may reset the
    /// network's trust values.
    pub fn build(&self, network: &mut Network) -> Box<dyn TrustAlg> {
        match self {
            Algorithm::None => Box::new(NoneTrust::new(network)),
            Algorithm::EigenTrust => Box::new(EigenTrust::new(network)),
            Algorithm::EigenTrustIncremental => Box::new(EigenTrustIncremental::new(network)),
            Algorithm::TnaSl => Box::new(TnaSl::new(network)),
            Algorithm::MyTrust => Box::new(PeerTrust::my_trust(network)),
            Algorithm::PeerTrust => Box::new(PeerTrust::peer_trust(network)),
            Algorithm::ThresholdTrust => Box::new(ThresholdTrust::new(network)),
        }
    }
}

// ============================================================================
// Feedback Normalisation
// ============================================================================

/// Peer `source`'s local trust distribution.
///
/// Each entry is `max(pos - neg, 0)` over the feedback `source` holds about
/// that peer, divided by the row sum. A peer that trusts nobody gets
/// `fallback` instead.
pub fn normalize_feedback(
    network: &Network,
    view: &FeedbackView,
    source: PeerId,
    fallback: &[f64],
) -> Vec<f64> {
    let n = network.num_peers();
    let mut row = Vec::with_capacity(n);
    let mut normalizer: u64 = 0;

    for peer in 0..n {
        let (pos, neg) = network.visible_feedback(view, source, peer);
        let score = pos.saturating_sub(neg) as u64;
        normalizer += score;
        row.push(score as f64);
    }

    if normalizer == 0 {
        return fallback.to_vec();
    }

    let normalizer = normalizer as f64;
    for value in row.iter_mut() {
        *value /= normalizer;
    }
    row
}

/// Row-major matrix of normalised feedback, one row per source peer.
///
/// Rows start out equal to the fallback distribution and are rebuilt one at
/// a time as transactions touching that source commit.
#[derive(Debug, Clone)]
pub struct FeedbackMatrix {
    rows: Vec<Vec<f64>>,
    fallback: Vec<f64>,
}

impl FeedbackMatrix {
    pub fn new(fallback: Vec<f64>) -> Self {
        let rows = vec![fallback.clone(); fallback.len()];
        Self { rows, fallback }
    }

    pub fn renormalize(&mut self, network: &Network, view: &FeedbackView, source: PeerId) {
        self.rows[source] = normalize_feedback(network, view, source, &self.fallback);
    }

    pub fn row(&self, source: PeerId) -> &[f64] {
        &self.rows[source]
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn fallback(&self) -> &[f64] {
        &self.fallback
    }
}
