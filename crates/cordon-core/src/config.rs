//! Run configuration and validation.
//!
//! [`SimConfig`] is built once from the judge handshake and then passed
//! by reference into every component. [`validate()`](SimConfig::validate)
//! rejects degenerate input up front so that no NaN or zero period can
//! leak into the numerical core.

use crate::error::ConfigError;

/// Dose at or above which an infected cell is cured at the start of a turn.
pub const CURE_THRESHOLD: f64 = 1.0;

/// Fraction of the concentration difference exchanged by each
/// axis-adjacent pair of cells per turn.
pub const DIFFUSION_RATE: f64 = 0.2;

// ── PlannerConfig ──────────────────────────────────────────────────

/// Tuning knobs for the Modeller and Planner.
///
/// None of these change the rules of the game; they only control how
/// much work the planner does and how it ranks candidates.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannerConfig {
    /// Manhattan radius searched around a placement, and half-width of the
    /// diffusion kernel window. Default: 6.
    pub kernel_radius: u32,
    /// Factor applied to the already-scheduled dose when testing whether a
    /// placement completes a cure. Default: 0.999.
    pub dose_safety: f64,
    /// Infection probability below which a cell is not worth curing.
    /// Default: 1e-9.
    pub infection_epsilon: f64,
    /// L1 distance below which an incrementally recomputed distribution is
    /// treated as unchanged. Default: 1e-6.
    pub change_tolerance: f64,
    /// Per-step discount applied to improvements by Manhattan distance from
    /// the placement. Default: 0.97.
    pub distance_discount: f64,
    /// Minimum total improvement a greedy step must add. Default: 0.0.
    pub min_gain: f64,
    /// Total infection probability at or below which the run is considered
    /// finished. Default: 1e-9.
    pub residual_infection: f64,
    /// Tolerance of the post-observation consistency check. Default: 1e-12.
    pub reconcile_epsilon: f64,
    /// Hard cap on elapsed turns, matching the judge's time limit.
    /// Default: 10 000.
    pub max_turns: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            kernel_radius: 6,
            dose_safety: 0.999,
            infection_epsilon: 1e-9,
            change_tolerance: 1e-6,
            distance_discount: 0.97,
            min_gain: 0.0,
            residual_infection: 1e-9,
            reconcile_epsilon: 1e-12,
            max_turns: 10_000,
        }
    }
}

impl PlannerConfig {
    /// Check every knob for finiteness and range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| Err(ConfigError::InvalidPlanner { reason });

        if self.kernel_radius == 0 {
            return invalid("kernel_radius must be at least 1".into());
        }
        if !(self.dose_safety > 0.0 && self.dose_safety <= 1.0) {
            return invalid(format!(
                "dose_safety must be in (0, 1], got {}",
                self.dose_safety
            ));
        }
        for (name, value) in [
            ("infection_epsilon", self.infection_epsilon),
            ("min_gain", self.min_gain),
            ("residual_infection", self.residual_infection),
        ] {
            if !value.is_finite() || value < 0.0 {
                return invalid(format!("{name} must be finite and >= 0, got {value}"));
            }
        }
        if !(self.change_tolerance.is_finite() && self.change_tolerance > 0.0) {
            return invalid(format!(
                "change_tolerance must be finite and positive, got {}",
                self.change_tolerance
            ));
        }
        if !(self.distance_discount > 0.0 && self.distance_discount <= 1.0) {
            return invalid(format!(
                "distance_discount must be in (0, 1], got {}",
                self.distance_discount
            ));
        }
        if !(self.reconcile_epsilon >= 0.0 && self.reconcile_epsilon < 0.5) {
            return invalid(format!(
                "reconcile_epsilon must be in [0, 0.5), got {}",
                self.reconcile_epsilon
            ));
        }
        if self.max_turns == 0 {
            return invalid("max_turns must be at least 1".into());
        }
        Ok(())
    }
}

// ── SimConfig ──────────────────────────────────────────────────────

/// Immutable parameters of one run.
///
/// `width`, `height`, `med_strength`, `kill_time` and `spread_prob` come
/// from the judge handshake; `planner` holds the agent's own tuning.
#[derive(Clone, Debug, PartialEq)]
pub struct SimConfig {
    /// Grid width in cells.
    pub width: u32,
    /// Grid height in cells.
    pub height: u32,
    /// Dose added to a cell by one `ADDMED`.
    pub med_strength: u32,
    /// Turns between an infection and its spread-and-death phase.
    pub kill_time: u32,
    /// Probability that a dying cell infects each clean neighbour.
    pub spread_prob: f64,
    /// Planner tuning.
    pub planner: PlannerConfig,
}

impl SimConfig {
    /// Build and validate a configuration with default planner tuning.
    pub fn new(
        width: u32,
        height: u32,
        med_strength: u32,
        kill_time: u32,
        spread_prob: f64,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            width,
            height,
            med_strength,
            kill_time,
            spread_prob,
            planner: PlannerConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Replace the planner tuning, re-validating the result.
    pub fn with_planner(mut self, planner: PlannerConfig) -> Result<Self, ConfigError> {
        self.planner = planner;
        self.validate()?;
        Ok(self)
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        if !(0.0..=1.0).contains(&self.spread_prob) {
            return Err(ConfigError::InvalidSpreadProb {
                value: self.spread_prob,
            });
        }
        if self.kill_time == 0 {
            return Err(ConfigError::ZeroKillTime);
        }
        if self.med_strength == 0 {
            return Err(ConfigError::ZeroMedStrength);
        }
        self.planner.validate()
    }

    /// Dose added by a single placement.
    pub fn dose(&self) -> f64 {
        f64::from(self.med_strength)
    }

    /// Number of cells in the grid.
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Turns between two observations.
    ///
    /// Very short kill times are stretched so that each cycle still has
    /// room for a meaningful plan.
    pub fn observation_period(&self) -> u32 {
        match self.kill_time {
            1 => 3,
            2 => 4,
            k => k,
        }
    }

    /// Planned turns in the first cycle.
    pub fn first_lookahead(&self) -> u32 {
        self.observation_period()
    }

    /// Planned turns in every cycle after an observation; the observation
    /// turn itself takes the remaining slot of the period.
    pub fn continuation_lookahead(&self) -> u32 {
        self.observation_period() - 1
    }

    /// Whether the turn that starts after `elapsed` completed turns is a
    /// spread-and-death phase.
    pub fn spreads_at(&self, elapsed: u32) -> bool {
        (elapsed + 1) % self.kill_time == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_config_accepted() {
        let c = SimConfig::new(10, 5, 20, 3, 0.5).unwrap();
        assert_eq!(c.cell_count(), 50);
        assert_eq!(c.dose(), 20.0);
    }

    #[test]
    fn empty_grid_rejected() {
        assert_eq!(
            SimConfig::new(0, 5, 20, 3, 0.5).unwrap_err(),
            ConfigError::EmptyGrid {
                width: 0,
                height: 5
            }
        );
    }

    #[test]
    fn spread_prob_out_of_range_rejected() {
        assert!(matches!(
            SimConfig::new(3, 3, 20, 3, 1.5),
            Err(ConfigError::InvalidSpreadProb { .. })
        ));
        assert!(matches!(
            SimConfig::new(3, 3, 20, 3, -0.1),
            Err(ConfigError::InvalidSpreadProb { .. })
        ));
        assert!(matches!(
            SimConfig::new(3, 3, 20, 3, f64::NAN),
            Err(ConfigError::InvalidSpreadProb { .. })
        ));
    }

    #[test]
    fn zero_period_and_strength_rejected() {
        assert_eq!(
            SimConfig::new(3, 3, 20, 0, 0.5).unwrap_err(),
            ConfigError::ZeroKillTime
        );
        assert_eq!(
            SimConfig::new(3, 3, 0, 2, 0.5).unwrap_err(),
            ConfigError::ZeroMedStrength
        );
    }

    #[test]
    fn planner_knobs_validated() {
        let base = SimConfig::new(3, 3, 20, 3, 0.5).unwrap();
        let bad = PlannerConfig {
            distance_discount: 0.0,
            ..PlannerConfig::default()
        };
        assert!(matches!(
            base.clone().with_planner(bad),
            Err(ConfigError::InvalidPlanner { .. })
        ));
        let bad = PlannerConfig {
            kernel_radius: 0,
            ..PlannerConfig::default()
        };
        assert!(base.with_planner(bad).is_err());
    }

    #[test]
    fn short_kill_times_stretch_the_period() {
        let period = |k| SimConfig::new(3, 3, 20, k, 0.5).unwrap().observation_period();
        assert_eq!(period(1), 3);
        assert_eq!(period(2), 4);
        assert_eq!(period(3), 3);
        assert_eq!(period(7), 7);
    }

    #[test]
    fn continuation_is_one_turn_shorter() {
        let c = SimConfig::new(3, 3, 20, 5, 0.5).unwrap();
        assert_eq!(c.first_lookahead(), 5);
        assert_eq!(c.continuation_lookahead(), 4);
    }

    #[test]
    fn spread_phase_follows_kill_time() {
        let c = SimConfig::new(3, 3, 20, 3, 0.5).unwrap();
        let phases: Vec<bool> = (0..7).map(|t| c.spreads_at(t)).collect();
        assert_eq!(phases, vec![false, false, true, false, false, true, false]);

        let every = SimConfig::new(3, 3, 20, 1, 0.5).unwrap();
        assert!((0..5).all(|t| every.spreads_at(t)));
    }
}
