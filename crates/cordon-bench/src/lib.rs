//! Benchmark scenarios for the Cordon outbreak agent.
//!
//! - [`reference_scenario`]: 40x40 grid, moderate outbreak.
//! - [`stress_scenario`]: 100x100 grid, dense outbreak, short kill time.
//! - [`Baseline`]: the state a planning cycle starts from.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use cordon_core::{Observation, SimConfig};
use cordon_model::{BeliefGrid, DiffusionKernel, DoseField, Modeller, PhaseSchedule};
use cordon_test_utils::fixtures::random_rows;

/// A starting grid and its run parameters.
pub struct Scenario {
    /// Run parameters.
    pub config: SimConfig,
    /// Initial grid rows.
    pub rows: Vec<String>,
}

impl Scenario {
    /// The initial grid.
    pub fn observation(&self) -> Observation {
        Observation::from_rows(&self.rows).expect("scenario rows are well formed")
    }

    /// Row slices, as the simulated judge takes them.
    pub fn row_refs(&self) -> Vec<&str> {
        self.rows.iter().map(String::as_str).collect()
    }
}

/// 40x40 grid, 5% infected, kill time 4, spread 0.5, strength 20.
pub fn reference_scenario(seed: u64) -> Scenario {
    scenario(40, 40, 0.05, 20, 4, 0.5, seed)
}

/// 100x100 grid, 10% infected, kill time 2, spread 0.8, strength 30.
pub fn stress_scenario(seed: u64) -> Scenario {
    scenario(100, 100, 0.10, 30, 2, 0.8, seed)
}

fn scenario(
    width: u32,
    height: u32,
    infected: f64,
    med_strength: u32,
    kill_time: u32,
    spread_prob: f64,
    seed: u64,
) -> Scenario {
    let rows = random_rows(width, height, infected, 0.05, seed);
    let config = SimConfig::new(width, height, med_strength, kill_time, spread_prob)
        .expect("scenario parameters are valid");
    Scenario { config, rows }
}

/// Everything a [`Modeller`] borrows, for the first window of a scenario.
pub struct Baseline {
    /// Run parameters.
    pub config: SimConfig,
    /// Kernel for the run.
    pub kernel: DiffusionKernel,
    /// Initial belief.
    pub belief: BeliefGrid,
    /// Initial (empty) dose.
    pub dose: DoseField,
}

impl Baseline {
    /// Prepare the first planning window of `scenario`.
    pub fn new(scenario: &Scenario) -> Self {
        let belief = BeliefGrid::from_observation(&scenario.observation())
            .expect("scenario grid fits");
        Self {
            kernel: DiffusionKernel::for_config(&scenario.config),
            dose: DoseField::new(*belief.grid()),
            config: scenario.config.clone(),
            belief,
        }
    }

    /// A modeller over the first window.
    pub fn modeller(&self) -> Modeller<'_> {
        let schedule = PhaseSchedule::new(&self.config, 0, self.config.first_lookahead());
        Modeller::new(&self.config, &self.kernel, &self.belief, &self.dose, schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenarios_match_their_config() {
        let s = reference_scenario(1);
        let obs = s.observation();
        assert_eq!(obs.width(), s.config.width);
        assert_eq!(obs.height(), s.config.height);
        let b = Baseline::new(&s);
        assert_eq!(b.modeller().turns(), 4);
    }
}
