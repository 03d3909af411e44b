use rand::Rng;

use crate::tm_interface::{Behavior, Cycle, FileId, PeerId};
use crate::tm_network::Network;

/// How a requester ranks candidate providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStrategy {
    /// Most trusted candidate
    Best,
    /// Least trusted candidate
    Worst,
    /// Any candidate, trust ignored
    Random,
}

/// Good peers seek the most trusted source; malicious archetypes either
/// favour their own kind or pick blindly.
pub fn pick_strategy(behavior: Behavior) -> SourceStrategy {
    match behavior {
        Behavior::Good => SourceStrategy::Best,
        Behavior::PurelyMalicious => SourceStrategy::Worst,
        Behavior::FeedbackMalicious => SourceStrategy::Random,
        Behavior::MaliciousProvider => SourceStrategy::Worst,
        Behavior::DisguisedMalicious => SourceStrategy::Random,
        Behavior::Sybil | Behavior::Unknown => SourceStrategy::Worst,
    }
}

/// Choose a provider of `file` for `requester` at `cycle`.
///
/// A candidate holds the file and has a free upload slot. Ties at the
/// extremal trust value are broken uniformly at random among every tied
/// candidate. Returns `None` when nobody can serve the request; exactly one
/// random draw is consumed otherwise.
pub fn pick_source<R: Rng>(
    network: &mut Network,
    rng: &mut R,
    cycle: Cycle,
    requester: PeerId,
    file: FileId,
    strategy: SourceStrategy,
) -> Option<PeerId> {
    let mut candidates: Vec<(PeerId, f64)> = Vec::new();
    for peer in 0..network.num_peers() {
        if !network.has_file(peer, file) {
            continue;
        }
        if !network.peer_mut(peer).upload.available(cycle) {
            continue;
        }
        candidates.push((peer, network.trust(requester, peer)));
    }

    if candidates.is_empty() {
        return None;
    }

    let eligible: Vec<PeerId> = match strategy {
        SourceStrategy::Random => candidates.iter().map(|&(peer, _)| peer).collect(),
        SourceStrategy::Best => {
            let best = candidates
                .iter()
                .map(|&(_, trust)| trust)
                .fold(f64::NEG_INFINITY, f64::max);
            tied_at(&candidates, best)
        }
        SourceStrategy::Worst => {
            let worst = candidates
                .iter()
                .map(|&(_, trust)| trust)
                .fold(f64::INFINITY, f64::min);
            tied_at(&candidates, worst)
        }
    };

    // NaN trust can leave nobody tied at the extremum
    if eligible.is_empty() {
        return None;
    }

    Some(eligible[rng.gen_range(0..eligible.len())])
}

fn tied_at(candidates: &[(PeerId, f64)], target: f64) -> Vec<PeerId> {
    candidates
        .iter()
        .filter(|&&(_, trust)| trust == target)
        .map(|&(peer, _)| peer)
        .collect()
}
