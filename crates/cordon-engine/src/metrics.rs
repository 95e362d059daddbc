//! Counters collected over one run.
//!
//! [`RunMetrics`] is updated in place by [`Run`](crate::Run) as it plays
//! and returned in the [`RunSummary`](crate::RunSummary); the binary logs
//! it when the run ends.

/// Cumulative counters for a single run.
///
/// Durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunMetrics {
    /// Turns played, including observation turns.
    pub turns: u32,
    /// Doses placed.
    pub doses: u32,
    /// Turns spent waiting.
    pub wait_turns: u32,
    /// Observations taken.
    pub observations: u32,
    /// Planning cycles completed.
    pub planning_cycles: u32,
    /// Non-empty cure footprints built across all cycles.
    pub footprints: u64,
    /// Footprints left after dominance filtering, across all cycles.
    pub frontier: u64,
    /// Wall-clock time spent planning.
    pub planning_us: u64,
    /// Expected infected cells when the run ended.
    pub residual_infection: f64,
}

impl RunMetrics {
    /// Mean planning time per cycle, in microseconds.
    pub fn mean_planning_us(&self) -> u64 {
        if self.planning_cycles == 0 {
            0
        } else {
            self.planning_us / u64::from(self.planning_cycles)
        }
    }
}
