//! Conflicts under resolution
//!
//! Once a solution has been issued for a conflict, the conflict is left alone
//! until it either disappears from detection (resolved) or the solution's
//! first command is older than the grace period without effect (stale).

use crate::maneuver::{Conflict, Solution};

/// Seconds after the first command's time before a conflict is reprocessed
pub const DEFAULT_GRACE_PERIOD: f64 = 20.0;

/// A conflict with the solution issued for it
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictResolutionRecord {
    pub conflict: Conflict,
    pub solution: Solution,
    /// Simulation time at registration, in seconds
    pub registered_at: f64,
}

impl ConflictResolutionRecord {
    /// Simulation time the grace period counts from
    pub fn reference_time(&self) -> f64 {
        self.solution
            .first_command_time()
            .map(|t| t as f64)
            .unwrap_or(self.registered_at)
    }
}

/// Records removed by one [`ConflictTracker::evict`] pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Eviction {
    pub resolved: Vec<ConflictResolutionRecord>,
    pub stale: Vec<ConflictResolutionRecord>,
}

impl Eviction {
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty() && self.stale.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ConflictTracker {
    records: Vec<ConflictResolutionRecord>,
    grace_period: f64,
}

impl Default for ConflictTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ConflictTracker {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    pub fn with_grace_period(mut self, seconds: f64) -> Self {
        self.grace_period = seconds;
        self
    }

    pub fn grace_period(&self) -> f64 {
        self.grace_period
    }

    pub fn is_tracked(&self, conflict: &Conflict) -> bool {
        self.records.iter().any(|r| &r.conflict == conflict)
    }

    /// Track `conflict`, replacing any earlier record for the same pair
    pub fn register(&mut self, conflict: Conflict, solution: Solution, now: f64) {
        let record = ConflictResolutionRecord {
            conflict,
            solution,
            registered_at: now,
        };
        match self.records.iter_mut().find(|r| r.conflict == record.conflict) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    /// Drop records that are resolved or stale at time `now`
    ///
    /// Commands already scheduled for a stale record are left in place.
    pub fn evict(&mut self, detected: &[Conflict], now: f64) -> Eviction {
        let mut eviction = Eviction::default();
        let grace = self.grace_period;

        for record in std::mem::take(&mut self.records) {
            if !detected.contains(&record.conflict) {
                tracing::debug!(conflict = %record.conflict, "Conflict resolved");
                eviction.resolved.push(record);
            } else if now > record.reference_time() + grace {
                tracing::warn!(
                    conflict = %record.conflict,
                    now,
                    first_command = record.reference_time(),
                    "Conflict has not been resolved by the issued commands; it will be processed again"
                );
                eviction.stale.push(record);
            } else {
                self.records.push(record);
            }
        }

        eviction
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ConflictResolutionRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maneuver::Command;

    fn conflict() -> Conflict {
        Conflict::new("KLM12", "BAW3", 2.1, 95.0)
    }

    fn solution_at(time: u64) -> Solution {
        Solution::new("KLM12", vec![Command::heading(time, 90), Command::heading(time + 60, 45)])
    }

    #[test]
    fn test_stale_after_grace_period() {
        let mut tracker = ConflictTracker::new();
        tracker.register(conflict(), solution_at(100), 90.0);

        let eviction = tracker.evict(&[conflict()], 115.0);
        assert!(eviction.is_empty());
        assert!(tracker.is_tracked(&conflict()));

        let eviction = tracker.evict(&[conflict()], 125.0);
        assert_eq!(eviction.stale.len(), 1);
        assert!(eviction.resolved.is_empty());
        assert!(!tracker.is_tracked(&conflict()));
    }

    #[test]
    fn test_boundary_is_not_stale() {
        let mut tracker = ConflictTracker::new();
        tracker.register(conflict(), solution_at(100), 90.0);
        assert!(tracker.evict(&[conflict()], 120.0).is_empty());
    }

    #[test]
    fn test_resolved_when_no_longer_detected() {
        let mut tracker = ConflictTracker::new();
        tracker.register(conflict(), solution_at(100), 90.0);

        let eviction = tracker.evict(&[Conflict::new("AFR1", "DLH2", 1.0, 10.0)], 101.0);
        assert_eq!(eviction.resolved.len(), 1);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_identity_ignores_order_and_metrics() {
        let mut tracker = ConflictTracker::new();
        tracker.register(conflict(), solution_at(100), 90.0);

        let redetected = Conflict::new("BAW3", "KLM12", 0.4, 12.0);
        assert!(tracker.is_tracked(&redetected));
        assert!(tracker.evict(&[redetected], 100.0).is_empty());
    }

    #[test]
    fn test_register_replaces() {
        let mut tracker = ConflictTracker::new();
        tracker.register(conflict(), solution_at(100), 90.0);
        tracker.register(conflict(), solution_at(200), 190.0);

        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.records()[0].solution.first_command_time(), Some(200));
    }

    #[test]
    fn test_empty_solution_counts_from_registration() {
        let mut tracker = ConflictTracker::new().with_grace_period(5.0);
        tracker.register(conflict(), Solution::new("KLM12", vec![]), 50.0);

        assert!(tracker.evict(&[conflict()], 55.0).is_empty());
        assert_eq!(tracker.evict(&[conflict()], 55.5).stale.len(), 1);
    }
}
