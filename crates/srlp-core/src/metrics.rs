//! Global atomic counters for SRLP runs.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of a CLI command).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters, no allocations and no locking.
pub struct Metrics {
    records_simulated: AtomicU64,
    scenarios_evaluated: AtomicU64,
    scenario_failures: AtomicU64,
    fallbacks: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            records_simulated: AtomicU64::new(0),
            scenarios_evaluated: AtomicU64::new(0),
            scenario_failures: AtomicU64::new(0),
            fallbacks: AtomicU64::new(0),
        }
    }

    /// Add `count` simulated records.
    pub fn add_records_simulated(&self, count: u64) {
        self.records_simulated.fetch_add(count, Ordering::Relaxed);
        tracing::trace!(metric = "records_simulated", count, "counter incremented");
    }

    pub fn inc_scenarios_evaluated(&self) {
        self.scenarios_evaluated.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "scenarios_evaluated", "counter incremented");
    }

    pub fn inc_scenario_failures(&self) {
        self.scenario_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "scenario_failures", "counter incremented");
    }

    /// Count a scenario or provider name that resolved to a default.
    pub fn inc_fallbacks(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "fallbacks", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            records_simulated = self.records_simulated(),
            scenarios_evaluated = self.scenarios_evaluated(),
            scenario_failures = self.scenario_failures(),
            fallbacks = self.fallbacks(),
        );
    }

    pub fn records_simulated(&self) -> u64 {
        self.records_simulated.load(Ordering::Relaxed)
    }

    pub fn scenarios_evaluated(&self) -> u64 {
        self.scenarios_evaluated.load(Ordering::Relaxed)
    }

    pub fn scenario_failures(&self) -> u64 {
        self.scenario_failures.load(Ordering::Relaxed)
    }

    pub fn fallbacks(&self) -> u64 {
        self.fallbacks.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.records_simulated.store(0, Ordering::Relaxed);
        self.scenarios_evaluated.store(0, Ordering::Relaxed);
        self.scenario_failures.store(0, Ordering::Relaxed);
        self.fallbacks.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = Metrics::new();
        m.add_records_simulated(45);
        m.add_records_simulated(5);
        assert_eq!(m.records_simulated(), 50);

        m.inc_scenarios_evaluated();
        m.inc_scenario_failures();
        m.inc_fallbacks();
        m.inc_fallbacks();
        assert_eq!(m.scenarios_evaluated(), 1);
        assert_eq!(m.scenario_failures(), 1);
        assert_eq!(m.fallbacks(), 2);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.add_records_simulated(3);
        m.inc_scenarios_evaluated();
        m.inc_fallbacks();
        m.reset();
        assert_eq!(m.records_simulated(), 0);
        assert_eq!(m.scenarios_evaluated(), 0);
        assert_eq!(m.fallbacks(), 0);
    }
}
