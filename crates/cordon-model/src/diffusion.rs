//! Dose diffusion.
//!
//! Two views of the same process:
//!
//! - [`DoseField`] tracks the actual dose on the grid and steps it with the
//!   judge's own arithmetic, so it matches the true concentration exactly.
//! - [`DiffusionKernel`] is the response to a single placement on an
//!   unbounded plane, tabulated once per run and queried by offset.
//!
//! Both share [`diffuse_window`], one explicit pairwise exchange step.

use cordon_core::{SimConfig, CURE_THRESHOLD, DIFFUSION_RATE};
use cordon_space::{CellIndex, Grid};

/// One diffusion step over a `cols x rows` window of `values`.
///
/// Cell `(x, y)` of the window lives at `origin + y * stride + x`. Each
/// horizontally adjacent pair, then each vertically adjacent pair,
/// exchanges [`DIFFUSION_RATE`] of its difference, visiting the window
/// row-major. All exchanges read the pre-step values; the accumulated
/// deltas are applied at the end. Cells outside the window are untouched,
/// so the window edge reflects.
pub(crate) fn diffuse_window(
    values: &mut [f64],
    delta: &mut [f64],
    cols: usize,
    rows: usize,
    stride: usize,
    origin: usize,
) {
    for y in 0..rows {
        let row = origin + y * stride;
        delta[row..row + cols].fill(0.0);
    }
    for y in 0..rows {
        for x in 0..cols {
            let i = origin + y * stride + x;
            if x > 0 {
                let w = i - 1;
                delta[w] += (values[i] - values[w]) * DIFFUSION_RATE;
                delta[i] += (values[w] - values[i]) * DIFFUSION_RATE;
            }
            if y > 0 {
                let n = i - stride;
                delta[n] += (values[i] - values[n]) * DIFFUSION_RATE;
                delta[i] += (values[n] - values[i]) * DIFFUSION_RATE;
            }
        }
    }
    for y in 0..rows {
        let row = origin + y * stride;
        for i in row..row + cols {
            values[i] += delta[i];
        }
    }
}

// ── DoseField ──────────────────────────────────────────────────────

/// The dose concentration on every cell of the grid.
///
/// Stored in the grid's padded layout; border entries stay at zero.
#[derive(Clone, Debug, PartialEq)]
pub struct DoseField {
    grid: Grid,
    values: Vec<f64>,
}

impl DoseField {
    /// An all-zero field.
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            values: vec![0.0; grid.padded_len()],
        }
    }

    /// The grid this field covers.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Dose at a padded index.
    pub fn get(&self, index: CellIndex) -> f64 {
        self.values[index]
    }

    /// Dose at column `x`, row `y`.
    pub fn at(&self, x: u32, y: u32) -> f64 {
        self.values[self.grid.index(x, y)]
    }

    /// Whether the dose at `index` cures an infected cell this turn.
    pub fn cures(&self, index: CellIndex) -> bool {
        self.values[index] >= CURE_THRESHOLD
    }

    /// Add `amount` at a padded index.
    pub fn add(&mut self, index: CellIndex, amount: f64) {
        debug_assert!(self.grid.is_interior(index));
        self.values[index] += amount;
    }

    /// Advance one turn of diffusion. Grid edges reflect: no dose is lost.
    pub fn diffuse(&mut self) {
        let mut delta = vec![0.0; self.values.len()];
        let (cols, rows) = (self.grid.width() as usize, self.grid.height() as usize);
        let origin = self.grid.index(0, 0);
        diffuse_window(
            &mut self.values,
            &mut delta,
            cols,
            rows,
            self.grid.stride(),
            origin,
        );
    }

    /// Total dose on the grid.
    pub fn total(&self) -> f64 {
        self.grid.cells().map(|i| self.values[i]).sum()
    }

    /// The padded buffer, border included.
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

// ── DiffusionKernel ────────────────────────────────────────────────

/// Dose reaching offset `(dx, dy)` from a single placement after `dt`
/// turns, ignoring grid edges.
///
/// The table is produced by running [`diffuse_window`] on a square with
/// half-width `radius + horizon`, wide enough that nothing reaches its
/// edge within `horizon` turns. Ignoring real grid edges underestimates
/// the dose near a wall, never overestimates it.
#[derive(Clone, Debug)]
pub struct DiffusionKernel {
    strength: f64,
    radius: u32,
    horizon: u32,
    half: usize,
    side: usize,
    layers: Vec<Vec<f64>>,
}

impl DiffusionKernel {
    /// Tabulate the response to a dose of `strength` for offsets with
    /// `|dx|, |dy| <= radius` and delays up to `horizon` turns.
    pub fn build(strength: f64, radius: u32, horizon: u32) -> Self {
        let half = (radius + horizon) as usize;
        let side = 2 * half + 1;
        let mut field = vec![0.0; side * side];
        let mut delta = vec![0.0; side * side];
        field[half * side + half] = strength;

        let mut layers = Vec::with_capacity(horizon as usize + 1);
        layers.push(field.clone());
        for _ in 0..horizon {
            diffuse_window(&mut field, &mut delta, side, side, side, 0);
            layers.push(field.clone());
        }

        Self {
            strength,
            radius,
            horizon,
            half,
            side,
            layers,
        }
    }

    /// The kernel for one run: placement dose, configured radius, and a
    /// horizon covering one observation period.
    pub fn for_config(config: &SimConfig) -> Self {
        Self::build(
            config.dose(),
            config.planner.kernel_radius,
            config.observation_period(),
        )
    }

    /// Dose at offset `(dx, dy)` after `dt` turns.
    ///
    /// Zero outside the tabulated range (`|dx| > radius`, `|dy| > radius`
    /// or `dt > horizon`).
    pub fn reach(&self, dx: i32, dy: i32, dt: u32) -> f64 {
        if dt > self.horizon
            || dx.unsigned_abs() > self.radius
            || dy.unsigned_abs() > self.radius
        {
            return 0.0;
        }
        let x = (self.half as i64 + i64::from(dx)) as usize;
        let y = (self.half as i64 + i64::from(dy)) as usize;
        self.layers[dt as usize][y * self.side + x]
    }

    /// Total dose in the window after `dt` turns.
    pub fn total(&self, dt: u32) -> f64 {
        self.layers
            .get(dt as usize)
            .map_or(0.0, |layer| layer.iter().sum())
    }

    /// Dose of one placement.
    pub fn strength(&self) -> f64 {
        self.strength
    }

    /// Largest Manhattan offset with a tabulated value.
    pub fn radius(&self) -> u32 {
        self.radius
    }

    /// Largest tabulated delay.
    pub fn horizon(&self) -> u32 {
        self.horizon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn first_step_spreads_a_fifth_to_each_neighbour() {
        let k = DiffusionKernel::build(10.0, 3, 2);
        assert_eq!(k.reach(0, 0, 0), 10.0);
        assert_eq!(k.reach(1, 0, 0), 0.0);
        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            assert!((k.reach(dx, dy, 1) - 2.0).abs() < 1e-12);
        }
        assert!((k.reach(0, 0, 1) - 2.0).abs() < 1e-12);
        assert_eq!(k.reach(1, 1, 1), 0.0);
    }

    #[test]
    fn reach_is_zero_outside_the_table() {
        let k = DiffusionKernel::build(10.0, 2, 3);
        assert_eq!(k.reach(3, 0, 1), 0.0);
        assert_eq!(k.reach(1, -3, 2), 0.0);
        assert_eq!(k.reach(0, 0, 4), 0.0);
        assert_eq!(k.total(4), 0.0);
    }

    #[test]
    fn reach_covers_the_square() {
        let k = DiffusionKernel::build(10.0, 2, 4);
        assert!(k.reach(2, 1, 3) > 0.0);
        assert!(k.reach(-2, 2, 4) > 0.0);
        assert!((k.reach(2, -2, 4) - k.reach(-2, 2, 4)).abs() < 1e-12);
        // Corners are four steps away.
        assert_eq!(k.reach(2, 2, 3), 0.0);
    }

    #[test]
    fn field_edges_reflect() {
        let grid = Grid::new(3, 1).unwrap();
        let mut field = DoseField::new(grid);
        field.add(grid.index(0, 0), 10.0);
        field.diffuse();
        assert!((field.at(0, 0) - 8.0).abs() < 1e-12);
        assert!((field.at(1, 0) - 2.0).abs() < 1e-12);
        assert_eq!(field.at(2, 0), 0.0);
        assert!(field.cures(grid.index(1, 0)));
        assert!(!field.cures(grid.index(2, 0)));
    }

    #[test]
    fn field_matches_kernel_away_from_walls() {
        let grid = Grid::new(31, 31).unwrap();
        let k = DiffusionKernel::build(25.0, 5, 6);
        let mut field = DoseField::new(grid);
        field.add(grid.index(15, 15), 25.0);
        for dt in 0..=6 {
            for dy in -5i32..=5 {
                for dx in -5i32..=5 {
                    let actual = field.at((15 + dx) as u32, (15 + dy) as u32);
                    assert!((actual - k.reach(dx, dy, dt)).abs() < 1e-12);
                }
            }
            field.diffuse();
        }
    }

    #[test]
    fn border_stays_empty() {
        let grid = Grid::new(4, 4).unwrap();
        let mut field = DoseField::new(grid);
        field.add(grid.index(0, 3), 50.0);
        for _ in 0..10 {
            field.diffuse();
        }
        for i in 0..grid.padded_len() {
            if !grid.is_interior(i) {
                assert_eq!(field.get(i), 0.0);
            }
        }
    }

    proptest! {
        #[test]
        fn kernel_conserves_mass(
            strength in 1.0f64..100.0,
            radius in 1u32..7,
            horizon in 0u32..12,
        ) {
            let k = DiffusionKernel::build(strength, radius, horizon);
            for dt in 0..=horizon {
                prop_assert!((k.total(dt) - strength).abs() < 1e-9 * strength);
            }
        }

        #[test]
        fn kernel_is_symmetric(strength in 1.0f64..100.0, dt in 0u32..8) {
            let k = DiffusionKernel::build(strength, 4, 8);
            for dy in -4i32..=4 {
                for dx in -4i32..=4 {
                    let v = k.reach(dx, dy, dt);
                    prop_assert!(v >= 0.0);
                    prop_assert!((v - k.reach(-dx, dy, dt)).abs() < 1e-9);
                    prop_assert!((v - k.reach(dx, -dy, dt)).abs() < 1e-9);
                    prop_assert!((v - k.reach(dy, dx, dt)).abs() < 1e-9);
                }
            }
        }

        #[test]
        fn field_conserves_mass(
            w in 1u32..9, h in 1u32..9,
            drops in prop::collection::vec((0u32..9, 0u32..9, 1.0f64..50.0), 1..6),
            steps in 0usize..15,
        ) {
            let grid = Grid::new(w, h).unwrap();
            let mut field = DoseField::new(grid);
            let mut mass = 0.0;
            for (x, y, amount) in drops {
                field.add(grid.index(x % w, y % h), amount);
                mass += amount;
            }
            for _ in 0..steps {
                field.diffuse();
            }
            prop_assert!((field.total() - mass).abs() < 1e-9 * mass);
        }
    }
}
