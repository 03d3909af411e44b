use std::cmp::Ordering;

/// Subjective-logic opinion: belief, disbelief, uncertainty and base rate.
///
/// `belief + disbelief + uncertainty` stays at 1 through every operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Opinion {
    pub belief: f64,
    pub disbelief: f64,
    pub uncertainty: f64,
    pub base_rate: f64,
}

impl Opinion {
    pub fn new(belief: f64, disbelief: f64, uncertainty: f64, base_rate: f64) -> Self {
        Self {
            belief,
            disbelief,
            uncertainty,
            base_rate,
        }
    }

    /// Total ignorance with the given base rate
    pub fn vacuous(base_rate: f64) -> Self {
        Self::new(0.0, 0.0, 1.0, base_rate)
    }

    /// Rebuild belief mass from positive/negative evidence counts
    pub fn edit(&mut self, pos: u32, neg: u32) {
        let total = pos as f64 + neg as f64 + 2.0;
        self.belief = pos as f64 / total;
        self.disbelief = neg as f64 / total;
        self.uncertainty = 1.0 - self.belief - self.disbelief;
    }

    pub fn expected_value(&self) -> f64 {
        self.belief + self.base_rate * self.uncertainty
    }

    /// Opinion about `that`'s target derived through trust in the advisor
    /// holding `that`.
    pub fn discount(&self, that: &Opinion) -> Opinion {
        let belief = self.belief * that.belief;
        let disbelief = self.belief * that.disbelief;
        Opinion::new(belief, disbelief, 1.0 - belief - disbelief, that.base_rate)
    }

    /// Fuse two independent opinions about the same target
    pub fn consensus(&self, that: &Opinion) -> Opinion {
        let (belief, disbelief) = if self.uncertainty == 0.0 && that.uncertainty == 0.0 {
            let belief = (self.belief + that.belief) / 2.0;
            (belief, 1.0 - belief)
        } else {
            let denom = self.uncertainty + that.uncertainty - self.uncertainty * that.uncertainty;
            (
                (self.belief * that.uncertainty + that.belief * self.uncertainty) / denom,
                (self.disbelief * that.uncertainty + that.disbelief * self.uncertainty) / denom,
            )
        };
        Opinion::new(belief, disbelief, 1.0 - belief - disbelief, self.base_rate)
    }

    /// Confidence ordering: lower uncertainty ranks higher, ties go to the
    /// larger belief.
    pub fn confidence_cmp(&self, that: &Opinion) -> Ordering {
        match that.uncertainty.partial_cmp(&self.uncertainty) {
            Some(Ordering::Equal) | None => self
                .belief
                .partial_cmp(&that.belief)
                .unwrap_or(Ordering::Equal),
            Some(order) => order,
        }
    }

    pub fn mass(&self) -> f64 {
        self.belief + self.disbelief + self.uncertainty
    }
}
