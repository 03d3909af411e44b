use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::tm_error::{Result, SimError};
use crate::tm_interface::{Behavior, Cycle};

// ============================================================================
// Run Parameters
// ============================================================================

/// Immutable run parameters, as recorded in a trace header
#[derive(Debug, Clone, PartialEq)]
pub struct SimParams {
    pub num_users: usize,
    pub num_files: usize,
    /// Measured transactions (warm-up excluded)
    pub num_trans: usize,
    /// Maximum concurrent connections per direction
    pub band_max: usize,
    /// Cycles one upload/download occupies a connection
    pub band_per: Cycle,
    pub warmup: usize,
    pub zipf: f64,
    pub pre_trusted: usize,
    pub usr_good: usize,
    pub usr_pure: usize,
    pub usr_feed: usize,
    pub usr_prov: usize,
    pub usr_disg: usize,
    pub usr_sybl: usize,
    pub smart_gen: bool,
    /// Seed the trace generator used
    pub generator_seed: u64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            num_users: 50,
            num_files: 1000,
            num_trans: 5000,
            band_max: 10,
            band_per: 10,
            warmup: 500,
            zipf: 0.4,
            pre_trusted: 3,
            usr_good: 50,
            usr_pure: 0,
            usr_feed: 0,
            usr_prov: 0,
            usr_disg: 0,
            usr_sybl: 0,
            smart_gen: true,
            generator_seed: 0,
        }
    }
}

impl SimParams {
    pub fn malicious(&self) -> usize {
        self.usr_pure + self.usr_feed + self.usr_prov + self.usr_disg + self.usr_sybl
    }

    /// Total number of requests in a trace (warm-up plus measured)
    pub fn total_requests(&self) -> usize {
        self.warmup + self.num_trans
    }

    /// Header count declared for a behavior. `Unknown` is never declared.
    pub fn declared(&self, behavior: Behavior) -> Option<usize> {
        match behavior {
            Behavior::Good => Some(self.usr_good),
            Behavior::PurelyMalicious => Some(self.usr_pure),
            Behavior::FeedbackMalicious => Some(self.usr_feed),
            Behavior::MaliciousProvider => Some(self.usr_prov),
            Behavior::DisguisedMalicious => Some(self.usr_disg),
            Behavior::Sybil => Some(self.usr_sybl),
            Behavior::Unknown => None,
        }
    }

    /// Reject parameter sets no run can be built from
    pub fn validate(&self) -> Result<()> {
        if self.num_users == 0 {
            return Err(SimError::InvalidConfig("network has no users".into()));
        }
        if self.band_max == 0 || self.band_per == 0 {
            return Err(SimError::InvalidConfig(format!(
                "bandwidth capacity ({}) and period ({}) must be positive",
                self.band_max, self.band_per
            )));
        }
        if self.malicious() > self.num_users {
            return Err(SimError::InvalidConfig(format!(
                "{} malicious users exceed the {} users in the network",
                self.malicious(),
                self.num_users
            )));
        }
        if self.usr_good + self.malicious() > self.num_users {
            return Err(SimError::InvalidConfig(format!(
                "{} good and {} malicious users exceed the {} users in the network",
                self.usr_good,
                self.malicious(),
                self.num_users
            )));
        }
        if self.pre_trusted > self.usr_good {
            return Err(SimError::InvalidConfig(format!(
                "{} pre-trusted users exceed the {} good users",
                self.pre_trusted, self.usr_good
            )));
        }
        Ok(())
    }

    /// Check the header's per-behavior counts against the peers actually listed
    pub fn check_population<I>(&self, behaviors: I) -> Result<()>
    where
        I: IntoIterator<Item = Behavior>,
    {
        let mut counts = [0usize; 7];
        for behavior in behaviors {
            counts[behavior.code() as usize] += 1;
        }

        for code in 0..=5u8 {
            let Some(behavior) = Behavior::from_code(code) else {
                continue;
            };
            let declared = self.declared(behavior).unwrap_or(0);
            if counts[code as usize] != declared {
                return Err(SimError::InvalidConfig(format!(
                    "header declares {} {:?} users but the trace lists {}",
                    declared, behavior, counts[code as usize]
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Simulation Context
// ============================================================================

/// Run parameters plus the single random stream every component draws from
pub struct SimContext {
    pub params: SimParams,
    pub seed: u64,
    pub rng: StdRng,
}

impl SimContext {
    /// Build a context; without a seed one is drawn from entropy and kept so the
    /// run can be replayed.
    pub fn new(params: SimParams, seed: Option<u64>) -> Self {
        let seed = resolve_seed(seed);
        Self {
            params,
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

pub fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| StdRng::from_entropy().next_u64())
}
