//! Per-cell belief over {clean, infected, dead}.

use cordon_core::{CellState, DivergenceError, Observation};
use cordon_space::{CellIndex, Grid, SpaceError};

use crate::diffusion::DoseField;

/// Probability of a cell being clean or infected; the remainder is dead.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Distribution {
    /// Probability the cell is clean.
    pub clean: f64,
    /// Probability the cell is infected.
    pub infected: f64,
}

impl Distribution {
    /// Certainly clean.
    pub const CLEAN: Self = Self {
        clean: 1.0,
        infected: 0.0,
    };
    /// Certainly infected.
    pub const INFECTED: Self = Self {
        clean: 0.0,
        infected: 1.0,
    };
    /// Certainly dead.
    pub const DEAD: Self = Self {
        clean: 0.0,
        infected: 0.0,
    };

    /// The certain distribution for an observed state.
    pub fn from_state(state: CellState) -> Self {
        match state {
            CellState::Clean => Self::CLEAN,
            CellState::Infected => Self::INFECTED,
            CellState::Dead => Self::DEAD,
        }
    }

    /// Probability the cell is dead.
    pub fn dead(&self) -> f64 {
        1.0 - self.clean - self.infected
    }

    /// Probability of one state.
    pub fn probability(&self, state: CellState) -> f64 {
        match state {
            CellState::Clean => self.clean,
            CellState::Infected => self.infected,
            CellState::Dead => self.dead(),
        }
    }

    /// After a curing dose: all infected mass becomes clean.
    pub fn cured(self) -> Self {
        Self {
            clean: self.clean + self.infected,
            infected: 0.0,
        }
    }

    /// After a spread-and-death phase.
    ///
    /// Infected mass dies. Clean mass stays clean only if no neighbour
    /// infects it; neighbours are treated as independent.
    pub fn propagated(self, neighbours: [Self; 4], spread_prob: f64) -> Self {
        let stay = neighbours
            .iter()
            .fold(1.0, |acc, n| acc * (1.0 - n.infected * spread_prob));
        Self {
            clean: self.clean * stay,
            infected: self.clean * (1.0 - stay),
        }
    }

    /// L1 distance over the clean and infected probabilities.
    pub fn distance(&self, other: &Self) -> f64 {
        (self.clean - other.clean).abs() + (self.infected - other.infected).abs()
    }

    /// Probability of being clean at the end of a window, counting an
    /// infected cell as clean when the dose already there cures it.
    pub fn effective_clean(&self, cured_by_dose: bool) -> f64 {
        if cured_by_dose {
            self.clean + self.infected
        } else {
            self.clean
        }
    }

    /// Each component in `[0, 1]` and their sum at most `1`, within `eps`.
    pub fn is_valid(&self, eps: f64) -> bool {
        (-eps..=1.0 + eps).contains(&self.clean)
            && (-eps..=1.0 + eps).contains(&self.infected)
            && self.clean + self.infected <= 1.0 + eps
    }
}

// ── BeliefGrid ─────────────────────────────────────────────────────

/// A [`Distribution`] for every cell, in the grid's padded layout.
///
/// Border entries are [`Distribution::DEAD`]: they never infect and are
/// never infected, so interior cells need no edge checks.
#[derive(Clone, Debug, PartialEq)]
pub struct BeliefGrid {
    grid: Grid,
    cells: Vec<Distribution>,
}

impl BeliefGrid {
    /// Certain belief matching an observation.
    pub fn from_observation(observation: &Observation) -> Result<Self, SpaceError> {
        let grid = Grid::new(observation.width(), observation.height())?;
        let mut cells = vec![Distribution::DEAD; grid.padded_len()];
        for (index, &state) in grid.cells().zip(observation.cells()) {
            cells[index] = Distribution::from_state(state);
        }
        Ok(Self { grid, cells })
    }

    /// The grid this belief covers.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Distribution at a padded index.
    pub fn get(&self, index: CellIndex) -> Distribution {
        self.cells[index]
    }

    /// Distribution at column `x`, row `y`.
    pub fn at(&self, x: u32, y: u32) -> Distribution {
        self.cells[self.grid.index(x, y)]
    }

    /// Overwrite an in-grid distribution.
    pub fn set(&mut self, index: CellIndex, value: Distribution) {
        debug_assert!(self.grid.is_interior(index));
        self.cells[index] = value;
    }

    /// Cure every cell whose dose reaches the cure threshold.
    pub fn cure_dosed(&mut self, dose: &DoseField) {
        for index in self.grid.cells() {
            if dose.cures(index) {
                self.cells[index] = self.cells[index].cured();
            }
        }
    }

    /// The belief after a spread-and-death phase.
    pub fn propagate(&self, spread_prob: f64) -> Self {
        let mut next = self.clone();
        for index in self.grid.cells() {
            let neighbours = self.grid.neighbours(index).map(|n| self.cells[n]);
            next.cells[index] = self.cells[index].propagated(neighbours, spread_prob);
        }
        next
    }

    /// The belief after one full turn: cure under `dose`, then propagate
    /// if `spread` carries this turn's spread probability.
    pub fn step(&self, dose: &DoseField, spread: Option<f64>) -> Self {
        let mut next = self.clone();
        next.cure_dosed(dose);
        match spread {
            Some(p) => next.propagate(p),
            None => next,
        }
    }

    /// One cell of [`step`](BeliefGrid::step), reading only this cell and
    /// its neighbours. Produces bit-identical values.
    pub fn step_cell(&self, index: CellIndex, dose: &DoseField, spread: Option<f64>) -> Distribution {
        let after_cure = |i: CellIndex| {
            let d = self.cells[i];
            if dose.cures(i) {
                d.cured()
            } else {
                d
            }
        };
        let own = after_cure(index);
        match spread {
            Some(p) => own.propagated(self.grid.neighbours(index).map(after_cure), p),
            None => own,
        }
    }

    /// Sum of infection probabilities: the expected number of infected cells.
    pub fn total_infection(&self) -> f64 {
        self.grid.cells().map(|i| self.cells[i].infected).sum()
    }

    /// Expected number of clean cells.
    pub fn expected_clean(&self) -> f64 {
        self.grid.cells().map(|i| self.cells[i].clean).sum()
    }

    /// Check that every observed state was possible and no other state was
    /// certain. Reports the first contradicting cell in row-major order.
    pub fn reconcile(&self, observation: &Observation, eps: f64) -> Result<(), DivergenceError> {
        for (index, &observed) in self.grid.cells().zip(observation.cells()) {
            let d = self.cells[index];
            let impossible = d.probability(observed) <= eps;
            let contradicted = [CellState::Clean, CellState::Infected, CellState::Dead]
                .into_iter()
                .any(|other| other != observed && d.probability(other) >= 1.0 - eps);
            if impossible || contradicted {
                let (x, y) = self.grid.coords(index);
                return Err(DivergenceError {
                    x,
                    y,
                    observed,
                    clean: d.clean,
                    infected: d.infected,
                });
            }
        }
        Ok(())
    }
}
