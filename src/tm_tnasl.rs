use std::cmp::Ordering;

use log::{debug, trace};

use crate::tm_interface::{Cycle, FeedbackView, PeerId, Transaction};
use crate::tm_network::Network;
use crate::tm_opinion::Opinion;
use crate::tm_trust::TrustAlg;

/// Base rate of opinions about pre-trusted peers
pub const PRE_TRUSTED_BASE_RATE: f64 = 1.0;

/// Base rate of opinions about everybody else
pub const DEFAULT_BASE_RATE: f64 = 0.5;

/// Squarings after which propagation stops even if entries still improve
pub const MAX_SQUARINGS: usize = 32;

/// Dense n x n opinion matrix, `get(a, b)` is a's opinion of b
#[derive(Debug, Clone)]
struct OpinionMatrix {
    n: usize,
    cells: Vec<Opinion>,
}

impl OpinionMatrix {
    fn get(&self, a: PeerId, b: PeerId) -> &Opinion {
        &self.cells[a * self.n + b]
    }

    fn get_mut(&mut self, a: PeerId, b: PeerId) -> &mut Opinion {
        &mut self.cells[a * self.n + b]
    }

    /// Transitive step: `dest[i][j]` fuses every path `i -> k -> j`
    fn square(&self) -> OpinionMatrix {
        let n = self.n;
        let mut cells = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                // the k = 0 path seeds the fusion directly
                let mut fused = self.get(i, 0).discount(self.get(0, j));
                for k in 1..n {
                    let path = self.get(i, k).discount(self.get(k, j));
                    fused = fused.consensus(&path);
                }
                cells.push(fused);
            }
        }
        OpinionMatrix { n, cells }
    }
}

/// Trust network analysis with subjective logic.
///
/// Direct opinions come from feedback counts; compute_trust squares the
/// opinion matrix until no entry gains confidence, keeping the most confident
/// opinion seen for every pair, and exports expected values.
pub struct TnaSl {
    opinions: OpinionMatrix,
}

impl TnaSl {
    pub fn new(network: &Network) -> Self {
        let n = network.num_peers();
        let mut cells = Vec::with_capacity(n * n);
        for _truster in 0..n {
            for subject in 0..n {
                let base_rate = if network.peer(subject).pre_trusted {
                    PRE_TRUSTED_BASE_RATE
                } else {
                    DEFAULT_BASE_RATE
                };
                cells.push(Opinion::vacuous(base_rate));
            }
        }
        Self {
            opinions: OpinionMatrix { n, cells },
        }
    }

    pub fn opinion(&self, truster: PeerId, subject: PeerId) -> &Opinion {
        self.opinions.get(truster, subject)
    }

    /// Most confident opinion per pair over all propagation depths
    pub fn propagate(&self) -> Vec<Opinion> {
        let mut best = self.opinions.cells.clone();
        let mut current = self.opinions.clone();

        for squaring in 1..=MAX_SQUARINGS {
            current = current.square();

            let mut improved = false;
            for (best, candidate) in best.iter_mut().zip(&current.cells) {
                if candidate.confidence_cmp(best) == Ordering::Greater {
                    *best = *candidate;
                    improved = true;
                }
            }

            if !improved {
                trace!("tnasl saturated after {} squarings", squaring);
                return best;
            }
        }

        debug!("tnasl stopped at {} squarings without saturating", MAX_SQUARINGS);
        best
    }
}

impl TrustAlg for TnaSl {
    fn name(&self) -> &'static str {
        "TNA-SL"
    }

    fn file_extension(&self) -> &'static str {
        "tnasl"
    }

    fn update(&mut self, network: &Network, view: &FeedbackView, transaction: &Transaction) {
        let truster = transaction.receiver;
        let subject = transaction.sender;
        let (pos, neg) = network.visible_feedback(view, truster, subject);
        self.opinions.get_mut(truster, subject).edit(pos, neg);
    }

    fn compute_trust(&mut self, network: &mut Network, _view: &FeedbackView, peer: PeerId, _cycle: Cycle) {
        let n = self.opinions.n;
        let best = self.propagate();
        for subject in 0..n {
            network.set_trust(peer, subject, best[peer * n + subject].expected_value());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tm_interface::Behavior;
    use crate::tm_network::Peer;

    fn network(pre_trusted: &[bool]) -> Network {
        let peers = pre_trusted
            .iter()
            .map(|&p| Peer::new(Behavior::Good, 1.0, 1.0, p, 1, 1))
            .collect();
        Network::new(peers, 1)
    }

    fn feedback(network: &mut Network, truster: PeerId, subject: PeerId, pos: usize, neg: usize) {
        for _ in 0..pos {
            network.relation_mut(truster, subject).record_global(true);
        }
        for _ in 0..neg {
            network.relation_mut(truster, subject).record_global(false);
        }
    }

    #[test]
    fn test_initial_opinions_are_vacuous() {
        let network = network(&[true, false]);
        let alg = TnaSl::new(&network);
        assert_eq!(*alg.opinion(1, 0), Opinion::vacuous(PRE_TRUSTED_BASE_RATE));
        assert_eq!(*alg.opinion(0, 1), Opinion::vacuous(DEFAULT_BASE_RATE));
    }

    #[test]
    fn test_no_evidence_exports_base_rate() {
        let mut network = network(&[true, false, false]);
        let view = FeedbackView::public(3);
        let mut alg = TnaSl::new(&network);

        alg.compute_trust(&mut network, &view, 2, 0);
        assert_eq!(network.trust(2, 0), PRE_TRUSTED_BASE_RATE);
        assert_eq!(network.trust(2, 1), DEFAULT_BASE_RATE);
    }

    #[test]
    fn test_update_edits_receiver_opinion_of_sender() {
        let mut network = network(&[false, false]);
        let view = FeedbackView::public(2);
        let mut alg = TnaSl::new(&network);

        feedback(&mut network, 0, 1, 2, 0);
        alg.update(&network, &view, &Transaction { commit: 1, sender: 1, receiver: 0, file: 0, valid: true });

        let op = alg.opinion(0, 1);
        assert!((op.belief - 0.5).abs() < 1e-12);
        assert_eq!(*alg.opinion(1, 0), Opinion::vacuous(DEFAULT_BASE_RATE));
    }

    #[test]
    fn test_update_reads_active_history() {
        let mut network = network(&[false, false]);
        let public = FeedbackView::public(2);
        let honest = public.with_honest(&[0]);
        let mut alg = TnaSl::new(&network);

        // broadcast praise, private complaints
        feedback(&mut network, 0, 1, 2, 0);
        network.relation_mut(0, 1).record_honest(false);
        network.relation_mut(0, 1).record_honest(false);

        let change = Transaction::view_change(1, 0);
        alg.update(&network, &public, &change);
        assert!((alg.opinion(0, 1).belief - 0.5).abs() < 1e-12);
        assert_eq!(alg.opinion(0, 1).disbelief, 0.0);

        alg.update(&network, &honest, &change);
        assert_eq!(alg.opinion(0, 1).belief, 0.0);
        assert!((alg.opinion(0, 1).disbelief - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_trust_propagates_through_intermediary() {
        let mut network = network(&[false, false, false]);
        let view = FeedbackView::public(3);
        let mut alg = TnaSl::new(&network);

        // 0 trusts 1, 1 trusts 2, 0 has never met 2
        feedback(&mut network, 0, 1, 8, 0);
        feedback(&mut network, 1, 2, 8, 0);
        alg.update(&network, &view, &Transaction::view_change(1, 0));
        alg.update(&network, &view, &Transaction::view_change(2, 1));

        alg.compute_trust(&mut network, &view, 0, 0);

        let direct = alg.opinion(0, 2);
        assert_eq!(direct.uncertainty, 1.0);
        let best = alg.propagate();
        let derived = best[2];
        assert!(derived.uncertainty < 1.0);
        assert!(derived.belief > 0.0);
        assert!((derived.mass() - 1.0).abs() < 1e-9);
        assert!(network.trust(0, 2) > DEFAULT_BASE_RATE);
    }
}
