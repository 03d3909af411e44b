use crate::tm_interface::{Cycle, FeedbackView, PeerId, Transaction};
use crate::tm_network::Network;
use crate::tm_trust::{FeedbackMatrix, TrustAlg};

/// Weight of the feedback-credibility term
pub const ALPHA: f64 = 1.0;

/// Weight of the context-factor term
pub const BETA: f64 = 0.0;

/// Credibility granted to good peers; everybody else gets none
pub const GOOD_CREDIBILITY: f64 = 0.5;

/// Context factor applied to every transaction
pub const CONTEXT_FACTOR: f64 = 1.0;

fn zero_all_trust(network: &mut Network) {
    let n = network.num_peers();
    for source in 0..n {
        for peer in 0..n {
            network.set_trust(source, peer, 0.0);
        }
    }
}

// ============================================================================
// PeerTrust
// ============================================================================

/// Credibility-weighted feedback: `T(u, i) = alpha * S(u, i) * Cr(i) + beta * CF`.
///
/// A peer that trusts nobody has an all-zero distribution. Each term is
/// written as the trust toward peer `i`; nothing accumulates across terms.
/// The same computation is published under two names.
pub struct PeerTrust {
    name: &'static str,
    extension: &'static str,
    local: FeedbackMatrix,
}

impl PeerTrust {
    fn with_labels(network: &mut Network, name: &'static str, extension: &'static str) -> Self {
        zero_all_trust(network);
        Self {
            name,
            extension,
            local: FeedbackMatrix::new(vec![0.0; network.num_peers()]),
        }
    }

    pub fn peer_trust(network: &mut Network) -> Self {
        Self::with_labels(network, "PeerTrust", "peertrust")
    }

    pub fn my_trust(network: &mut Network) -> Self {
        Self::with_labels(network, "MyTrust", "mytrust")
    }

    pub fn credibility(network: &Network, peer: PeerId) -> f64 {
        if network.behavior(peer).is_good() {
            GOOD_CREDIBILITY
        } else {
            0.0
        }
    }
}

impl TrustAlg for PeerTrust {
    fn name(&self) -> &'static str {
        self.name
    }

    fn file_extension(&self) -> &'static str {
        self.extension
    }

    fn update(&mut self, network: &Network, view: &FeedbackView, transaction: &Transaction) {
        self.local.renormalize(network, view, transaction.receiver);
    }

    fn compute_trust(&mut self, network: &mut Network, _view: &FeedbackView, peer: PeerId, _cycle: Cycle) {
        for i in 0..network.num_peers() {
            let satisfaction = self.local.row(peer)[i];
            let trust = ALPHA * satisfaction * Self::credibility(network, i) + BETA * CONTEXT_FACTOR;
            network.set_trust(peer, i, trust);
        }
    }
}

// ============================================================================
// ThresholdTrust
// ============================================================================

/// Baseline that exports the running partial sum of a peer's feedback
/// distribution, in peer order, as trust.
pub struct ThresholdTrust {
    local: FeedbackMatrix,
}

impl ThresholdTrust {
    pub fn new(network: &mut Network) -> Self {
        zero_all_trust(network);
        Self {
            local: FeedbackMatrix::new(vec![0.0; network.num_peers()]),
        }
    }
}

impl TrustAlg for ThresholdTrust {
    fn name(&self) -> &'static str {
        "ThresholdTrust"
    }

    fn file_extension(&self) -> &'static str {
        "thresholdt"
    }

    fn update(&mut self, network: &Network, view: &FeedbackView, transaction: &Transaction) {
        self.local.renormalize(network, view, transaction.receiver);
    }

    fn compute_trust(&mut self, network: &mut Network, _view: &FeedbackView, peer: PeerId, _cycle: Cycle) {
        let mut running = 0.0;
        for i in 0..network.num_peers() {
            running += self.local.row(peer)[i];
            network.set_trust(peer, i, running);
        }
    }
}

// ============================================================================
// None
// ============================================================================

/// No trust management. Every trust value stays zero, so source selection
/// degenerates to a uniform pick.
pub struct NoneTrust;

impl NoneTrust {
    pub fn new(network: &mut Network) -> Self {
        zero_all_trust(network);
        NoneTrust
    }
}

impl TrustAlg for NoneTrust {
    fn name(&self) -> &'static str {
        "None"
    }

    fn file_extension(&self) -> &'static str {
        "none"
    }

    fn update(&mut self, _network: &Network, _view: &FeedbackView, _transaction: &Transaction) {}

    fn compute_trust(&mut self, _network: &mut Network, _view: &FeedbackView, _peer: PeerId, _cycle: Cycle) {}
}
