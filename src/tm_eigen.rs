use log::{debug, trace};

use crate::tm_interface::{Cycle, FeedbackView, PeerId, Transaction};
use crate::tm_network::Network;
use crate::tm_trust::{FeedbackMatrix, TrustAlg};

/// Weight of the pre-trust vector in every multiplication
pub const ALPHA: f64 = 0.5;

/// L-infinity distance under which two iterates are considered equal
pub const EPSILON: f64 = 0.001;

/// Multiplication budget per trust computation. The seed spends one and each
/// pair spends two, so up to nine multiplications actually run.
pub const MAX_MULTIPLICATIONS: usize = 8;

/// Adaptive skip interval ceiling for the incremental variant
pub const MAX_SKIP: Cycle = 64;

// ============================================================================
// Power Iteration
// ============================================================================

#[derive(Debug, Clone)]
pub struct PowerIteration {
    pub vector: Vec<f64>,
    pub multiplications: usize,
    pub converged: bool,
}

/// One step `(1 - alpha) * M^T * x + alpha * p`, where row `j` of `rows` is
/// peer j's local trust distribution.
pub fn single_multiply(rows: &[Vec<f64>], pretrust: &[f64], x: &[f64], alpha: f64) -> Vec<f64> {
    let n = pretrust.len();
    let mut dest = vec![0.0; n];
    for (j, row) in rows.iter().enumerate() {
        let weight = x[j];
        if weight == 0.0 {
            continue;
        }
        for (i, value) in row.iter().enumerate() {
            dest[i] += value * weight;
        }
    }

    for i in 0..n {
        dest[i] = (1.0 - alpha) * dest[i] + alpha * pretrust[i];
    }
    dest
}

pub fn has_converged(a: &[f64], b: &[f64], epsilon: f64) -> bool {
    a.iter().zip(b).all(|(x, y)| (x - y).abs() <= epsilon)
}

/// Iterate from the pre-trust vector in pairs of multiplications until two
/// successive iterates agree within `epsilon` or `budget` is spent.
///
/// The seeding multiplication counts against `budget`, then each pair takes
/// two more; a pair always runs while any budget remains, so a budget of 8
/// allows four pairs (nine multiplications in total).
pub fn power_iteration(rows: &[Vec<f64>], pretrust: &[f64], budget: usize) -> PowerIteration {
    let mut a = single_multiply(rows, pretrust, pretrust, ALPHA);
    let mut multiplications = 1;
    let mut remaining = budget.saturating_sub(1);
    let mut converged = false;

    loop {
        let b = single_multiply(rows, pretrust, &a, ALPHA);
        a = single_multiply(rows, pretrust, &b, ALPHA);
        multiplications += 2;
        remaining = remaining.saturating_sub(2);

        if has_converged(&a, &b, EPSILON) {
            converged = true;
            break;
        }
        if remaining == 0 {
            break;
        }
    }

    trace!(
        "power iteration: {} multiplications, converged={}",
        multiplications,
        converged
    );

    PowerIteration {
        vector: a,
        multiplications,
        converged,
    }
}

/// Uniform over pre-trusted peers if any exist, uniform over everybody
/// otherwise.
pub fn pretrust_vector(network: &Network) -> Vec<f64> {
    let n = network.num_peers();
    let pre_trusted = network.pre_trusted_count();

    network
        .peers()
        .iter()
        .map(|peer| {
            if pre_trusted == 0 {
                1.0 / n as f64
            } else if peer.pre_trusted {
                1.0 / pre_trusted as f64
            } else {
                0.0
            }
        })
        .collect()
}

// ============================================================================
// EigenTrust
// ============================================================================

pub struct EigenTrust {
    pretrust: Vec<f64>,
    local: FeedbackMatrix,
}

impl EigenTrust {
    pub fn new(network: &Network) -> Self {
        let pretrust = pretrust_vector(network);
        Self {
            local: FeedbackMatrix::new(pretrust.clone()),
            pretrust,
        }
    }

    pub fn pretrust(&self) -> &[f64] {
        &self.pretrust
    }

    pub fn local_trust(&self, source: PeerId) -> &[f64] {
        self.local.row(source)
    }

    /// Global trust vector under the current local trust matrix
    pub fn global_trust(&self) -> Vec<f64> {
        power_iteration(self.local.rows(), &self.pretrust, MAX_MULTIPLICATIONS).vector
    }

    fn write_row(network: &mut Network, peer: PeerId, vector: &[f64]) {
        for (i, &value) in vector.iter().enumerate() {
            network.set_trust(peer, i, value);
        }
    }
}

impl TrustAlg for EigenTrust {
    fn name(&self) -> &'static str {
        "EigenTrust"
    }

    fn file_extension(&self) -> &'static str {
        "eigen"
    }

    fn update(&mut self, network: &Network, view: &FeedbackView, transaction: &Transaction) {
        self.local.renormalize(network, view, transaction.receiver);
    }

    fn compute_trust(&mut self, network: &mut Network, _view: &FeedbackView, peer: PeerId, _cycle: Cycle) {
        let global = self.global_trust();
        Self::write_row(network, peer, &global);
    }
}

// ============================================================================
// EigenTrust-Incremental
// ============================================================================

/// EigenTrust that recomputes only every `skip` cycles and publishes the
/// result to every peer.
///
/// `skip` doubles (up to 64) while successive results agree and halves (down
/// to 1) when they drift apart.
pub struct EigenTrustIncremental {
    inner: EigenTrust,
    skip: Cycle,
    previous: Option<Vec<f64>>,
}

impl EigenTrustIncremental {
    pub fn new(network: &Network) -> Self {
        Self {
            inner: EigenTrust::new(network),
            skip: 1,
            previous: None,
        }
    }

    pub fn skip(&self) -> Cycle {
        self.skip
    }
}

impl TrustAlg for EigenTrustIncremental {
    fn name(&self) -> &'static str {
        "EigenTrust-Incremental"
    }

    fn file_extension(&self) -> &'static str {
        "etinc"
    }

    fn update(&mut self, network: &Network, view: &FeedbackView, transaction: &Transaction) {
        self.inner.update(network, view, transaction);
    }

    fn compute_trust(&mut self, network: &mut Network, _view: &FeedbackView, peer: PeerId, cycle: Cycle) {
        let Some(previous) = self.previous.as_ref() else {
            // first computation seeds the requester's row only
            let current = self.inner.global_trust();
            EigenTrust::write_row(network, peer, &current);
            self.previous = Some(current);
            return;
        };

        if cycle % self.skip != 0 {
            return;
        }

        let current = self.inner.global_trust();
        let converged = has_converged(&current, previous, EPSILON);
        self.skip = if converged {
            (self.skip * 2).min(MAX_SKIP)
        } else {
            (self.skip / 2).max(1)
        };
        debug!(
            "etinc cycle {}: converged={}, skip now {}",
            cycle, converged, self.skip
        );

        for (target, &value) in current.iter().enumerate() {
            for source in 0..network.num_peers() {
                network.set_trust(source, target, value);
            }
        }
        self.previous = Some(current);
    }
}
