/// Run-scoped transaction and feedback counters.
///
/// Reset once at the warm-up boundary, so only the measured portion of a
/// trace is tabulated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
    /// Completed transactions that delivered an invalid file
    pub invalid_trans: u64,
    /// Requests declined because the receiver had the file or no download slot
    pub recv_blocked: u64,
    /// Requests with no eligible sender
    pub send_blocked: u64,
    pub feedback_truthful: u64,
    pub feedback_lies: u64,
    /// Transactions involving a sybil peer (no feedback recorded)
    pub feedback_sybil: u64,
    /// Valid files received by good peers
    pub good_successes: u64,
    /// Invalid files received by good peers
    pub good_failures: u64,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn incomplete(&self) -> u64 {
        self.recv_blocked + self.send_blocked
    }

    /// Requests that reached commit, out of `attempted`
    pub fn completed(&self, attempted: u64) -> u64 {
        attempted.saturating_sub(self.incomplete())
    }

    pub fn valid(&self, attempted: u64) -> u64 {
        self.completed(attempted).saturating_sub(self.invalid_trans)
    }

    pub fn good_total(&self) -> u64 {
        self.good_successes + self.good_failures
    }

    /// Fraction of good-peer transactions that delivered a valid file
    pub fn good_success_rate(&self) -> f64 {
        let total = self.good_total();
        if total == 0 {
            return 0.0;
        }
        self.good_successes as f64 / total as f64
    }
}
