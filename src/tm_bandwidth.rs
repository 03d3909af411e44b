use std::collections::VecDeque;

use crate::tm_interface::Cycle;

/// Connection-slot tracker for one direction (upload or download) of a peer.
///
/// Each occupied slot is a "busy until" marker; the queue length is the
/// number of connections in use. Expired markers are purged lazily the next
/// time availability is queried.
#[derive(Debug, Clone)]
pub struct BandwidthUnit {
    busy_until: VecDeque<Cycle>,
    capacity: usize,
    period: Cycle,
}

impl BandwidthUnit {
    pub fn new(capacity: usize, period: Cycle) -> Self {
        Self {
            busy_until: VecDeque::with_capacity(capacity),
            capacity,
            period,
        }
    }

    /// True if a connection slot is free at `cycle`
    pub fn available(&mut self, cycle: Cycle) -> bool {
        // markers are pushed in non-decreasing order, so the head expires first
        while let Some(&expiry) = self.busy_until.front() {
            if expiry > cycle {
                break;
            }
            self.busy_until.pop_front();
        }

        self.busy_until.len() < self.capacity
    }

    /// Occupy a slot for the next `period` cycles starting at `cycle`
    pub fn consume(&mut self, cycle: Cycle) {
        self.busy_until.push_back(cycle + self.period);
    }

    pub fn in_use(&self) -> usize {
        self.busy_until.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_exhausted_then_released() {
        let mut unit = BandwidthUnit::new(2, 3);

        unit.consume(0);
        unit.consume(0);
        assert!(!unit.available(0));
        assert!(!unit.available(2));

        // both markers expire exactly at cycle 3
        assert!(unit.available(3));
        assert_eq!(unit.in_use(), 0);
    }

    #[test]
    fn test_partial_release() {
        let mut unit = BandwidthUnit::new(2, 3);

        unit.consume(0);
        unit.consume(1);
        assert!(!unit.available(2));

        assert!(unit.available(3));
        assert_eq!(unit.in_use(), 1);

        unit.consume(3);
        assert!(!unit.available(3));
        assert!(unit.available(4));
    }

    #[test]
    fn test_zero_capacity_never_available() {
        let mut unit = BandwidthUnit::new(0, 1);
        assert!(!unit.available(0));
        assert!(!unit.available(100));
    }
}
