use log::debug;

use crate::tm_interface::{Cycle, FeedbackView, PeerId, Transaction};
use crate::tm_network::Network;
use crate::tm_trust::TrustAlg;

/// How malicious peers pool what they know before trusting anyone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MaliciousStrategy {
    /// No collusion; the trust algorithm sees broadcast feedback only
    #[default]
    Naive,
    /// A malicious requester consults its own honest history
    Isolated,
    /// Every malicious peer's honest history is pooled for malicious requesters
    Collective,
}

impl MaliciousStrategy {
    pub const ALL: [MaliciousStrategy; 3] = [
        MaliciousStrategy::Naive,
        MaliciousStrategy::Isolated,
        MaliciousStrategy::Collective,
    ];

    /// Case-insensitive lookup; unrecognised names select `Naive`
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "isolated" => MaliciousStrategy::Isolated,
            "collective" => MaliciousStrategy::Collective,
            _ => MaliciousStrategy::Naive,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MaliciousStrategy::Naive => "Naive",
            MaliciousStrategy::Isolated => "Isolated",
            MaliciousStrategy::Collective => "Collective",
        }
    }
}

/// Triggers trust computation, substituting honest feedback for colluding
/// peers while the computation runs.
///
/// The substitution is expressed as a [`FeedbackView`] handed to the trust
/// algorithm. Every relation row that changes view is announced to the
/// algorithm through a view-change transaction, once before computing and
/// once after, so derived state always matches the view it is read under.
pub struct MaliciousCoordinator {
    strategy: MaliciousStrategy,
    public: FeedbackView,
    collective: Option<Vec<PeerId>>,
}

impl MaliciousCoordinator {
    pub fn new(strategy: MaliciousStrategy, num_peers: usize) -> Self {
        Self {
            strategy,
            public: FeedbackView::public(num_peers),
            collective: None,
        }
    }

    pub fn strategy(&self) -> MaliciousStrategy {
        self.strategy
    }

    /// The view every algorithm reads outside a collusion window
    pub fn public_view(&self) -> &FeedbackView {
        &self.public
    }

    pub fn compute_trust(
        &mut self,
        network: &mut Network,
        alg: &mut dyn TrustAlg,
        requester: PeerId,
        cycle: Cycle,
    ) {
        if network.behavior(requester).is_good() {
            alg.compute_trust(network, &self.public, requester, cycle);
            return;
        }

        let colluders: Vec<PeerId> = match self.strategy {
            MaliciousStrategy::Naive => {
                alg.compute_trust(network, &self.public, requester, cycle);
                return;
            }
            MaliciousStrategy::Isolated => vec![requester],
            MaliciousStrategy::Collective => self.collective(network).to_vec(),
        };

        let honest = self.public.with_honest(&colluders);
        announce(network, alg, &honest, &colluders);
        alg.compute_trust(network, &honest, requester, cycle);
        announce(network, alg, &self.public, &colluders);
    }

    /// Every non-good peer, computed on first use
    fn collective(&mut self, network: &Network) -> &[PeerId] {
        self.collective.get_or_insert_with(|| {
            let members: Vec<PeerId> = (0..network.num_peers())
                .filter(|&peer| !network.behavior(peer).is_good())
                .collect();
            debug!("malicious collective formed with {} members", members.len());
            members
        })
    }
}

fn announce(network: &Network, alg: &mut dyn TrustAlg, view: &FeedbackView, rows: &[PeerId]) {
    for &source in rows {
        for peer in 0..network.num_peers() {
            alg.update(network, view, &Transaction::view_change(peer, source));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tm_interface::{Behavior, FeedbackHistory};
    use crate::tm_network::Peer;

    /// Records what it was shown so the coordinator's protocol can be checked
    #[derive(Default)]
    struct RecordingAlg {
        updates: Vec<(PeerId, PeerId, Vec<FeedbackHistory>)>,
        computes: Vec<(PeerId, Vec<FeedbackHistory>)>,
    }

    fn histories(view: &FeedbackView) -> Vec<FeedbackHistory> {
        (0..view.len()).map(|i| view.history(i)).collect()
    }

    impl TrustAlg for RecordingAlg {
        fn name(&self) -> &'static str {
            "Recording"
        }

        fn file_extension(&self) -> &'static str {
            "rec"
        }

        fn update(&mut self, _network: &Network, view: &FeedbackView, transaction: &Transaction) {
            self.updates
                .push((transaction.sender, transaction.receiver, histories(view)));
        }

        fn compute_trust(&mut self, _network: &mut Network, view: &FeedbackView, peer: PeerId, _cycle: Cycle) {
            self.computes.push((peer, histories(view)));
        }
    }

    fn network() -> Network {
        let peers = vec![
            Peer::new(Behavior::Good, 1.0, 1.0, true, 1, 1),
            Peer::new(Behavior::PurelyMalicious, 0.0, 0.0, false, 1, 1),
            Peer::new(Behavior::FeedbackMalicious, 0.0, 0.0, false, 1, 1),
        ];
        Network::new(peers, 1)
    }

    use crate::tm_interface::FeedbackHistory::{Global as G, Honest as H};

    #[test]
    fn test_strategy_names() {
        assert_eq!(MaliciousStrategy::from_name("ISOLATED"), MaliciousStrategy::Isolated);
        assert_eq!(MaliciousStrategy::from_name("collective"), MaliciousStrategy::Collective);
        assert_eq!(MaliciousStrategy::from_name("naive"), MaliciousStrategy::Naive);
        assert_eq!(MaliciousStrategy::from_name("sneaky"), MaliciousStrategy::Naive);
        assert_eq!(MaliciousStrategy::Collective.name(), "Collective");
    }

    #[test]
    fn test_naive_never_switches() {
        let mut network = network();
        let mut alg = RecordingAlg::default();
        let mut coordinator = MaliciousCoordinator::new(MaliciousStrategy::Naive, 3);

        coordinator.compute_trust(&mut network, &mut alg, 1, 5);
        assert!(alg.updates.is_empty());
        assert_eq!(alg.computes, vec![(1, vec![G, G, G])]);
    }

    #[test]
    fn test_good_requester_never_switches() {
        let mut network = network();
        let mut alg = RecordingAlg::default();
        let mut coordinator = MaliciousCoordinator::new(MaliciousStrategy::Collective, 3);

        coordinator.compute_trust(&mut network, &mut alg, 0, 5);
        assert!(alg.updates.is_empty());
        assert_eq!(alg.computes, vec![(0, vec![G, G, G])]);
    }

    #[test]
    fn test_isolated_switches_own_row() {
        let mut network = network();
        let mut alg = RecordingAlg::default();
        let mut coordinator = MaliciousCoordinator::new(MaliciousStrategy::Isolated, 3);

        coordinator.compute_trust(&mut network, &mut alg, 2, 5);

        assert_eq!(alg.computes, vec![(2, vec![G, G, H])]);
        assert_eq!(alg.updates.len(), 6);
        for (i, (sender, receiver, view)) in alg.updates.iter().enumerate() {
            assert_eq!(*sender, i % 3);
            assert_eq!(*receiver, 2);
            let expected = if i < 3 { vec![G, G, H] } else { vec![G, G, G] };
            assert_eq!(*view, expected);
        }
    }

    #[test]
    fn test_collective_switches_every_malicious_row() {
        let mut network = network();
        let mut alg = RecordingAlg::default();
        let mut coordinator = MaliciousCoordinator::new(MaliciousStrategy::Collective, 3);

        coordinator.compute_trust(&mut network, &mut alg, 1, 5);

        assert_eq!(alg.computes, vec![(1, vec![G, H, H])]);
        // two colluders, three relations each, switched on then off
        assert_eq!(alg.updates.len(), 12);
        let receivers: Vec<PeerId> = alg.updates.iter().map(|u| u.1).collect();
        assert_eq!(receivers, vec![1, 1, 1, 2, 2, 2, 1, 1, 1, 2, 2, 2]);
        assert!(alg.updates[6..].iter().all(|u| u.2 == vec![G, G, G]));
    }

    #[test]
    fn test_eigentrust_restored_to_public_rows() {
        use crate::tm_eigen::EigenTrust;
        use crate::tm_trust::normalize_feedback;

        for strategy in [MaliciousStrategy::Isolated, MaliciousStrategy::Collective] {
            let mut network = network();
            // good peer 0 vouches for 1 in both histories
            network.relation_mut(0, 1).record_honest(true);
            network.relation_mut(0, 1).record_global(true);
            // colluders badmouth 0 in public and praise each other
            network.relation_mut(1, 0).record_honest(true);
            network.relation_mut(1, 0).record_global(false);
            network.relation_mut(1, 2).record_honest(false);
            network.relation_mut(1, 2).record_global(true);
            network.relation_mut(2, 1).record_global(true);

            let mut coordinator = MaliciousCoordinator::new(strategy, 3);
            let public = coordinator.public_view().clone();
            let mut alg = EigenTrust::new(&network);
            for source in 0..3 {
                alg.update(&network, &public, &Transaction::view_change(0, source));
            }
            let fallback = alg.pretrust().to_vec();

            coordinator.compute_trust(&mut network, &mut alg, 1, 0);

            // the requester's row was computed from honest feedback
            assert!(network.trust(1, 0) > 0.6, "{:?}: {}", strategy, network.trust(1, 0));

            for source in 0..3 {
                let expected = normalize_feedback(&network, &public, source, &fallback);
                assert_eq!(alg.local_trust(source), expected.as_slice(), "{:?} row {}", strategy, source);
            }
            assert!((alg.global_trust()[0] - 0.5).abs() < 1e-12);
        }
    }
}
