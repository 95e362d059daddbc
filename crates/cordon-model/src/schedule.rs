//! Spread phases over a planning window.

use cordon_core::SimConfig;

/// Which turns of a window end in a spread-and-death phase.
///
/// Turn `s` of the window is the turn that starts after `start + s`
/// completed turns of the run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseSchedule {
    start: u32,
    spreads: Vec<bool>,
}

impl PhaseSchedule {
    /// The schedule for `turns` turns starting after `start` completed turns.
    pub fn new(config: &SimConfig, start: u32, turns: u32) -> Self {
        Self {
            start,
            spreads: (0..turns).map(|s| config.spreads_at(start + s)).collect(),
        }
    }

    /// An explicit schedule, for tests and benchmarks.
    pub fn from_flags(start: u32, spreads: Vec<bool>) -> Self {
        Self { start, spreads }
    }

    /// Completed turns before the window.
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Number of turns in the window.
    pub fn len(&self) -> usize {
        self.spreads.len()
    }

    /// Whether the window has no turns.
    pub fn is_empty(&self) -> bool {
        self.spreads.is_empty()
    }

    /// Whether turn `s` of the window spreads.
    pub fn spreads(&self, s: usize) -> bool {
        self.spreads[s]
    }
}
