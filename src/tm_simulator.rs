use log::{debug, info};
use rand::Rng;

use crate::tm_context::{SimContext, SimParams};
use crate::tm_error::{Result, SimError};
use crate::tm_interface::{Cycle, Transaction, TransactionRequest, PROGRESS_INTERVAL};
use crate::tm_malicious::{MaliciousCoordinator, MaliciousStrategy};
use crate::tm_network::Network;
use crate::tm_source::{pick_source, pick_strategy};
use crate::tm_stats::Statistics;
use crate::tm_trust::{Algorithm, TrustAlg};

// ============================================================================
// Run Result
// ============================================================================

/// Outcome of one trace replay
#[derive(Debug, Clone)]
pub struct SimResult {
    pub algorithm: &'static str,
    pub extension: &'static str,
    pub strategy: MaliciousStrategy,
    pub seed: u64,
    pub params: SimParams,
    pub stats: Statistics,
    /// Cycle at which the delay queue finally drained
    pub final_cycle: Cycle,
}

impl SimResult {
    pub fn attempted(&self) -> u64 {
        self.params.num_trans as u64
    }

    pub fn print_summary(&self) {
        let attempted = self.attempted();

        println!("\n╔════════════════════════════════════════════════════════╗");
        println!("║        Trust Simulation Results                        ║");
        println!("╚════════════════════════════════════════════════════════╝\n");

        println!("Configuration:");
        println!("  Algorithm: {}", self.algorithm);
        println!("  Strategy: {}", self.strategy.name());
        println!("  Seed: {}", self.seed);
        println!(
            "  Peers: {} ({} good, {} malicious, {} pre-trusted)",
            self.params.num_users,
            self.params.usr_good,
            self.params.malicious(),
            self.params.pre_trusted
        );
        println!("  Cycles: {}\n", self.final_cycle);

        println!("Transactions:");
        println!("  Attempted: {}", attempted);
        println!("  Completed: {}", self.stats.completed(attempted));
        println!("  Receiver blocked: {}", self.stats.recv_blocked);
        println!("  No eligible sender: {}", self.stats.send_blocked);
        println!("  Invalid: {}\n", self.stats.invalid_trans);

        println!("Feedback:");
        println!("  Truthful: {}", self.stats.feedback_truthful);
        println!("  Dishonest: {}", self.stats.feedback_lies);
        println!("  Sybil: {}\n", self.stats.feedback_sybil);

        println!("Good Users:");
        println!(
            "  Successes: {} / {} ({:.1}%)",
            self.stats.good_successes,
            self.stats.good_total(),
            self.stats.good_success_rate() * 100.0
        );
    }
}

// ============================================================================
// Simulator
// ============================================================================

/// Discrete-event transaction engine.
///
/// Each cycle first commits the transaction due at that cycle (file
/// transfer, feedback, trust update) and then serves one new request
/// (trust computation, source selection, bandwidth reservation).
pub struct Simulator {
    ctx: SimContext,
    network: Network,
    alg: Box<dyn TrustAlg>,
    coordinator: MaliciousCoordinator,
}

impl Simulator {
    pub fn new(
        params: SimParams,
        mut network: Network,
        algorithm: Algorithm,
        strategy: MaliciousStrategy,
        seed: Option<u64>,
    ) -> Self {
        let alg = algorithm.build(&mut network);
        let coordinator = MaliciousCoordinator::new(strategy, network.num_peers());
        Self {
            ctx: SimContext::new(params, seed),
            network,
            alg,
            coordinator,
        }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn stats(&self) -> &Statistics {
        &self.network.stats
    }

    pub fn seed(&self) -> u64 {
        self.ctx.seed
    }

    pub fn algorithm_name(&self) -> &'static str {
        self.alg.name()
    }

    /// Replay a whole trace: warm-up requests, statistics reset, measured
    /// requests, then drain the delay queue.
    pub fn run(mut self, requests: &[TransactionRequest]) -> Result<SimResult> {
        let warmup = self.ctx.params.warmup;
        let total = self.ctx.params.total_requests();
        if requests.len() < total {
            return Err(SimError::InvalidConfig(format!(
                "trace holds {} requests but {} are needed",
                requests.len(),
                total
            )));
        }

        info!(
            "{} / {}: warm-up phase ({} transactions)",
            self.alg.name(),
            self.coordinator.strategy().name(),
            warmup
        );
        for (i, request) in requests[..warmup].iter().enumerate() {
            self.sim_transaction(i as Cycle, request);
            if i != 0 && i % PROGRESS_INTERVAL == 0 {
                info!("warm-up transactions completed: {}", i);
            }
        }

        self.network.stats.reset();

        info!("simulation phase ({} transactions)", self.ctx.params.num_trans);
        for (i, request) in requests[warmup..total].iter().enumerate() {
            self.sim_transaction((warmup + i) as Cycle, request);
            if i != 0 && i % PROGRESS_INTERVAL == 0 {
                info!("transactions completed so far: {}", i);
            }
        }

        let final_cycle = self.commit_remaining(total as Cycle);
        info!(
            "simulation complete, delay queue drained at cycle {}",
            final_cycle
        );

        Ok(SimResult {
            algorithm: self.alg.name(),
            extension: self.alg.file_extension(),
            strategy: self.coordinator.strategy(),
            seed: self.ctx.seed,
            params: self.ctx.params.clone(),
            stats: self.network.stats.clone(),
            final_cycle,
        })
    }

    /// One cycle: commit what is due, then serve `request`
    pub fn sim_transaction(&mut self, cycle: Cycle, request: &TransactionRequest) {
        self.commit_due(cycle);
        self.queue_request(cycle, request);
    }

    /// Keep advancing the clock from `cycle` until no transaction is in
    /// flight. Returns the first cycle at which the queue was empty.
    pub fn commit_remaining(&mut self, mut cycle: Cycle) -> Cycle {
        while self.network.queue_len() > 0 {
            self.commit_due(cycle);
            cycle += 1;
        }
        cycle
    }

    // ------------------------------------------------------------------------
    // commit phase
    // ------------------------------------------------------------------------

    fn commit_due(&mut self, cycle: Cycle) {
        while let Some(&transaction) = self.network.peek_queue() {
            if transaction.commit > cycle {
                break;
            }
            self.commit_file(&transaction);
            self.commit_feedback(&transaction);
            self.alg
                .update(&self.network, self.coordinator.public_view(), &transaction);
            self.network.dequeue();
        }
    }

    fn commit_file(&mut self, transaction: &Transaction) {
        let receiver = self.network.peer(transaction.receiver);
        let good = receiver.behavior.is_good();
        let cleanup = receiver.cleanup;
        let draw: f64 = self.ctx.rng.gen();

        let keep = if !transaction.valid {
            self.network.stats.invalid_trans += 1;
            if good {
                self.network.stats.good_failures += 1;
            }
            draw > cleanup
        } else if good {
            self.network.stats.good_successes += 1;
            true
        } else {
            draw > 1.0 - cleanup
        };

        if keep {
            self.network
                .add_file(transaction.receiver, transaction.file, transaction.valid);
        }
    }

    fn commit_feedback(&mut self, transaction: &Transaction) {
        let sender = transaction.sender;
        let receiver = transaction.receiver;

        if self.network.behavior(sender).is_sybil() || self.network.behavior(receiver).is_sybil() {
            self.network.stats.feedback_sybil += 1;
            return;
        }

        self.network
            .relation_mut(receiver, sender)
            .record_honest(transaction.valid);

        let draw: f64 = self.ctx.rng.gen();
        let honest = draw <= self.network.peer(receiver).honesty;
        if honest {
            self.network.stats.feedback_truthful += 1;
        } else {
            self.network.stats.feedback_lies += 1;
        }
        self.network
            .relation_mut(receiver, sender)
            .record_global(transaction.valid == honest);
    }

    // ------------------------------------------------------------------------
    // request phase
    // ------------------------------------------------------------------------

    fn queue_request(&mut self, cycle: Cycle, request: &TransactionRequest) {
        let receiver = request.receiver;
        let file = request.file;

        if self.network.has_file(receiver, file)
            || !self.network.peer_mut(receiver).download.available(cycle)
        {
            self.network.stats.recv_blocked += 1;
            debug!("cycle {}: peer {} declined file {}", cycle, receiver, file);
            return;
        }

        self.coordinator
            .compute_trust(&mut self.network, self.alg.as_mut(), receiver, cycle);

        let strategy = pick_strategy(self.network.behavior(receiver));
        let Some(sender) = pick_source(
            &mut self.network,
            &mut self.ctx.rng,
            cycle,
            receiver,
            file,
            strategy,
        ) else {
            self.network.stats.send_blocked += 1;
            debug!("cycle {}: no sender for file {} (peer {})", cycle, file, receiver);
            return;
        };

        self.network.peer_mut(receiver).download.consume(cycle);
        self.network.peer_mut(sender).upload.consume(cycle);

        let valid = self.network.file_copy_valid(file, sender).unwrap_or(false);
        let transaction = Transaction {
            commit: cycle + self.ctx.params.band_per,
            sender,
            receiver,
            file,
            valid,
        };
        debug!(
            "cycle {}: peer {} -> peer {} file {} (valid={}), commits at {}",
            cycle, sender, receiver, file, valid, transaction.commit
        );
        self.network.enqueue(transaction);
    }
}
