//! The run loop: plan, execute, observe.
//!
//! [`Run`] owns the authoritative belief and dose field. Between
//! observations it advances both with the same rules the judge applies, so
//! the dose field is exact and the belief's support always contains the
//! truth. Each observation replaces the belief wholesale after checking
//! that it did not contradict the prediction.
//!
//! ```text
//! Planning ──▶ Executing ──▶ Observing ──┐
//!    ▲                                   │
//!    └───────────── infection left ◀─────┘
//!                                        │
//!                           contained ──▶ Done
//! ```

use std::time::Instant;

use tracing::{debug, info, warn};

use cordon_core::{Judge, Observation, ProtocolError, SimConfig};
use cordon_model::{BeliefGrid, DiffusionKernel, DoseField, Modeller, PhaseSchedule};
use cordon_space::Grid;

use crate::error::RunError;
use crate::metrics::RunMetrics;
use crate::planner::{Plan, Planner, Segment};

/// Where the run loop is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunPhase {
    /// Choosing actions for the next window.
    Planning,
    /// Sending the window's commands.
    Executing,
    /// Waiting on an observation.
    Observing,
    /// Finished; the judge has been told.
    Done,
}

/// Why a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// No infection probability left anywhere.
    Contained,
    /// The turn limit was reached first.
    TurnLimit,
}

/// The result of [`Run::play`].
#[derive(Clone, Debug)]
pub struct RunSummary {
    /// Why the run ended.
    pub outcome: RunOutcome,
    /// Counters collected along the way.
    pub metrics: RunMetrics,
}

/// One game against a judge.
pub struct Run {
    config: SimConfig,
    grid: Grid,
    kernel: DiffusionKernel,
    belief: BeliefGrid,
    dose: DoseField,
    elapsed: u32,
    phase: RunPhase,
    metrics: RunMetrics,
}

impl Run {
    /// Start a run from the handshake grid.
    pub fn new(config: SimConfig, initial: &Observation) -> Result<Self, RunError> {
        config.validate()?;
        check_dimensions(&config, initial)?;
        let belief = BeliefGrid::from_observation(initial)?;
        let grid = *belief.grid();
        let kernel = DiffusionKernel::for_config(&config);
        debug!(
            width = grid.width(),
            height = grid.height(),
            radius = kernel.radius(),
            horizon = kernel.horizon(),
            "run initialised"
        );
        Ok(Self {
            dose: DoseField::new(grid),
            config,
            grid,
            kernel,
            belief,
            elapsed: 0,
            phase: RunPhase::Planning,
            metrics: RunMetrics::default(),
        })
    }

    /// Run parameters.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Current belief.
    pub fn belief(&self) -> &BeliefGrid {
        &self.belief
    }

    /// Current dose field.
    pub fn dose(&self) -> &DoseField {
        &self.dose
    }

    /// Turns played so far.
    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    /// Current phase.
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Counters so far.
    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    /// Whether the belief leaves no meaningful infection anywhere.
    pub fn is_contained(&self) -> bool {
        self.belief.total_infection() <= self.config.planner.residual_infection
    }

    /// Play one turn locally, optionally placing a dose first.
    ///
    /// Mirrors the judge: add the dose, cure, spread if due, diffuse.
    pub fn advance(&mut self, placement: Option<(u32, u32)>) {
        if let Some((x, y)) = placement {
            self.dose.add(self.grid.index(x, y), self.config.dose());
            self.metrics.doses += 1;
        }
        let spread = self
            .config
            .spreads_at(self.elapsed)
            .then_some(self.config.spread_prob);
        self.belief = self.belief.step(&self.dose, spread);
        self.dose.diffuse();
        self.elapsed += 1;
        self.metrics.turns = self.elapsed;
    }

    /// Plan the next `turns` turns from the current state.
    pub fn plan(&mut self, turns: u32) -> Plan {
        self.phase = RunPhase::Planning;
        let started = Instant::now();
        let schedule = PhaseSchedule::new(&self.config, self.elapsed, turns);
        let mut modeller = Modeller::new(
            &self.config,
            &self.kernel,
            &self.belief,
            &self.dose,
            schedule,
        );
        let report = Planner::new(&self.config).plan(&mut modeller);
        let spent = started.elapsed().as_micros() as u64;

        self.metrics.planning_cycles += 1;
        self.metrics.footprints += report.footprints as u64;
        self.metrics.frontier += report.frontier as u64;
        self.metrics.planning_us += spent;
        info!(
            cycle = self.metrics.planning_cycles,
            elapsed = self.elapsed,
            turns,
            footprints = report.footprints,
            frontier = report.frontier,
            placements = report.plan.placements(),
            expected_gain = report.expected_gain,
            planning_us = spent,
            "planned window"
        );
        report.plan
    }

    /// Check an observation against the belief, then adopt it.
    ///
    /// Does not play the observation turn; see [`advance`](Run::advance).
    pub fn resync(&mut self, observation: &Observation) -> Result<(), RunError> {
        check_dimensions(&self.config, observation)?;
        self.belief
            .reconcile(observation, self.config.planner.reconcile_epsilon)?;
        self.belief = BeliefGrid::from_observation(observation)?;
        self.metrics.observations += 1;
        Ok(())
    }

    /// Play the game to the end and tell the judge it is over.
    pub fn play<J: Judge>(&mut self, judge: &mut J) -> Result<RunSummary, RunError> {
        let max_turns = self.config.planner.max_turns;
        let mut lookahead = self.config.first_lookahead();

        let outcome = 'cycles: loop {
            if self.is_contained() {
                break RunOutcome::Contained;
            }
            let remaining = max_turns.saturating_sub(self.elapsed);
            if remaining == 0 {
                break RunOutcome::TurnLimit;
            }

            let plan = self.plan(lookahead.min(remaining));

            self.phase = RunPhase::Executing;
            for segment in plan.segments() {
                match segment {
                    Segment::Place { x, y } => {
                        debug!(x, y, elapsed = self.elapsed, "ADDMED");
                        judge.add_med(x, y)?;
                        self.advance(Some((x, y)));
                    }
                    Segment::Wait(turns) => {
                        debug!(turns, elapsed = self.elapsed, "WAITTIME");
                        judge.wait_time(turns)?;
                        for _ in 0..turns {
                            self.advance(None);
                        }
                        self.metrics.wait_turns += turns;
                    }
                }
                if self.is_contained() {
                    break 'cycles RunOutcome::Contained;
                }
            }
            if self.elapsed >= max_turns {
                break RunOutcome::TurnLimit;
            }

            self.phase = RunPhase::Observing;
            let observation = judge.observe()?;
            self.resync(&observation)?;
            self.advance(None);
            debug!(
                elapsed = self.elapsed,
                residual = self.belief.total_infection(),
                "observed"
            );
            lookahead = self.config.continuation_lookahead();
        };

        self.phase = RunPhase::Done;
        judge.finish()?;
        self.metrics.residual_infection = self.belief.total_infection();
        if outcome == RunOutcome::TurnLimit {
            warn!(
                elapsed = self.elapsed,
                residual = self.metrics.residual_infection,
                "turn limit reached with infection left"
            );
        }
        info!(
            ?outcome,
            turns = self.metrics.turns,
            doses = self.metrics.doses,
            observations = self.metrics.observations,
            mean_planning_us = self.metrics.mean_planning_us(),
            "run finished"
        );
        Ok(RunSummary {
            outcome,
            metrics: self.metrics.clone(),
        })
    }
}

fn check_dimensions(config: &SimConfig, observation: &Observation) -> Result<(), ProtocolError> {
    if observation.width() != config.width || observation.height() != config.height {
        return Err(ProtocolError::MalformedGrid {
            reason: format!(
                "grid is {}x{}, expected {}x{}",
                observation.width(),
                observation.height(),
                config.width,
                config.height
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cordon_model::Distribution;
    use cordon_test_utils::fixtures::{config, observation};
    use cordon_test_utils::{JudgeCall, SimulatedJudge};

    fn run(rows: &[&str], strength: u32, kill_time: u32, p: f64) -> Run {
        Run::new(config(rows, strength, kill_time, p), &observation(rows)).unwrap()
    }

    #[test]
    fn one_dose_contains_an_isolated_cell() {
        let mut judge = SimulatedJudge::new(&["CVC"], 10, 5, 0.0, 3);
        let mut run = run(&["CVC"], 10, 5, 0.0);
        let summary = run.play(&mut judge).unwrap();
        assert_eq!(summary.outcome, RunOutcome::Contained);
        assert_eq!(
            judge.calls(),
            &[JudgeCall::AddMed { x: 1, y: 0 }, JudgeCall::Finish]
        );
        assert!(run.belief().at(1, 0).infected.abs() < 1e-12);
        assert!((run.belief().at(0, 0).clean - 1.0).abs() < 1e-12);
        assert!((run.belief().at(2, 0).clean - 1.0).abs() < 1e-12);
        assert_eq!(run.phase(), RunPhase::Done);
        assert_eq!(summary.metrics.doses, 1);
    }

    #[test]
    fn clean_grid_finishes_immediately() {
        let mut judge = SimulatedJudge::new(&["CC", "XC"], 10, 3, 0.5, 3);
        let mut run = run(&["CC", "XC"], 10, 3, 0.5);
        let summary = run.play(&mut judge).unwrap();
        assert_eq!(summary.outcome, RunOutcome::Contained);
        assert_eq!(judge.calls(), &[JudgeCall::Finish]);
        assert_eq!(summary.metrics.planning_cycles, 0);
    }

    #[test]
    fn advance_mirrors_the_judge() {
        let rows = ["CCCCC", "CVCCC", "CCCVC"];
        let mut judge = SimulatedJudge::new(&rows, 7, 2, 0.0, 9);
        let mut run = run(&rows, 7, 2, 0.0);
        let moves = [Some((0, 0)), None, Some((4, 2)), Some((4, 2)), None, Some((2, 1))];
        for m in moves {
            match m {
                Some((x, y)) => judge.add_med(x, y).unwrap(),
                None => judge.wait_time(1).unwrap(),
            }
            run.advance(m);
        }
        for y in 0..3 {
            for x in 0..5 {
                assert_eq!(run.dose().at(x, y).to_bits(), judge.med(x, y).to_bits());
            }
        }
        run.resync(&judge.observation()).unwrap();
    }

    #[test]
    fn resync_rejects_a_contradiction() {
        let mut run = run(&["CVC"], 10, 5, 0.0);
        let err = run.resync(&observation(&["CXC"])).unwrap_err();
        assert!(matches!(err, RunError::Divergence(_)));
        let err = run.resync(&observation(&["CV"])).unwrap_err();
        assert!(matches!(err, RunError::Protocol(_)));
    }

    #[test]
    fn resync_replaces_the_belief() {
        let mut run = run(&["CVC"], 10, 1, 0.5);
        run.advance(None);
        assert!(run.belief().at(0, 0).infected > 0.0);
        run.resync(&observation(&["VXC"])).unwrap();
        assert_eq!(run.belief().at(0, 0), Distribution::INFECTED);
        assert_eq!(run.belief().at(2, 0), Distribution::CLEAN);
    }

    #[test]
    fn turn_limit_stops_the_run() {
        let rows = ["VCCCVCCCV"];
        let planner = cordon_core::PlannerConfig {
            max_turns: 2,
            ..Default::default()
        };
        let config = config(&rows, 1, 10, 1.0).with_planner(planner).unwrap();
        let mut run = Run::new(config, &observation(&rows)).unwrap();
        let mut judge = SimulatedJudge::new(&rows, 1, 10, 1.0, 1).with_max_time(2);
        let summary = run.play(&mut judge).unwrap();
        assert_eq!(summary.outcome, RunOutcome::TurnLimit);
        assert_eq!(run.elapsed(), 2);
        assert_eq!(judge.calls().last(), Some(&JudgeCall::Finish));
    }
}
