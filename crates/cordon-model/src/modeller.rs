//! Baseline rollout and hypothetical-placement evaluation.
//!
//! A [`Modeller`] rolls the current belief and dose forward over one
//! planning window, keeping a snapshot of both at the start of every
//! turn. Placements are then judged against that baseline:
//!
//! 1. [`Modeller::make_cure_footprint`] works out which cells a placement
//!    would cure, and when.
//! 2. [`Modeller::simulate`] applies a set of footprints to the baseline,
//!    re-evaluates only the cells whose inputs changed, reads off the
//!    per-cell improvement at the end of the window, and restores the
//!    baseline exactly.

use indexmap::IndexMap;
use smallvec::SmallVec;

use cordon_core::{SimConfig, CURE_THRESHOLD};
use cordon_space::CellIndex;

use crate::belief::{BeliefGrid, Distribution};
use crate::diffusion::{DiffusionKernel, DoseField};
use crate::schedule::PhaseSchedule;

/// Per-cell gain in end-of-window clean probability, keyed by padded
/// index in first-changed order.
pub type ImprovementMap = IndexMap<CellIndex, f64>;

type CuredSet = SmallVec<[CellIndex; 8]>;

// ── CureFootprint ──────────────────────────────────────────────────

/// The cells one placement would cure, per turn of the window.
///
/// Each cell appears at most once, at the earliest turn the placement's
/// dose (plus the dose already scheduled) crosses the cure threshold while
/// the cell may be infected. Every per-turn set is sorted.
#[derive(Clone, Debug, PartialEq)]
pub struct CureFootprint {
    x: u32,
    y: u32,
    turn: usize,
    origin: CellIndex,
    cured: Vec<CuredSet>,
}

impl CureFootprint {
    /// Column of the placement.
    pub fn x(&self) -> u32 {
        self.x
    }

    /// Row of the placement.
    pub fn y(&self) -> u32 {
        self.y
    }

    /// Window turn at which the placement is made.
    pub fn turn(&self) -> usize {
        self.turn
    }

    /// Padded index of the placement cell.
    pub fn origin(&self) -> CellIndex {
        self.origin
    }

    /// Cells cured at window turn `s`.
    pub fn cured_at(&self, s: usize) -> &[CellIndex] {
        &self.cured[s]
    }

    /// Number of turns the footprint spans.
    pub fn turns(&self) -> usize {
        self.cured.len()
    }

    /// Whether the placement cures nothing.
    pub fn is_empty(&self) -> bool {
        self.cured.iter().all(|set| set.is_empty())
    }

    /// Number of (cell, turn) cures.
    pub fn size(&self) -> usize {
        self.cured.iter().map(|set| set.len()).sum()
    }

    /// Whether this footprint cures everything `other` cures, at the same
    /// turns. Every footprint dominates itself.
    pub fn dominates(&self, other: &CureFootprint) -> bool {
        self.cured.len() == other.cured.len()
            && self
                .cured
                .iter()
                .zip(&other.cured)
                .all(|(big, small)| is_superset(big, small))
    }
}

fn is_superset(big: &[CellIndex], small: &[CellIndex]) -> bool {
    if small.len() > big.len() {
        return false;
    }
    let mut rest = big.iter();
    small
        .iter()
        .all(|needle| rest.by_ref().any(|candidate| candidate == needle))
}

// ── Modeller ───────────────────────────────────────────────────────

struct UndoEntry {
    snapshot: usize,
    cell: CellIndex,
    previous: Distribution,
}

/// Baseline snapshots over one planning window.
///
/// Snapshot `s` holds the belief and dose at the start of window turn
/// `s`, for `s` in `0..=turns`. The last snapshot is the end of the window.
pub struct Modeller<'a> {
    config: &'a SimConfig,
    kernel: &'a DiffusionKernel,
    schedule: PhaseSchedule,
    beliefs: Vec<BeliefGrid>,
    doses: Vec<DoseField>,
    undo: Vec<UndoEntry>,
    marks: Vec<bool>,
}

impl<'a> Modeller<'a> {
    /// Roll `belief` and `dose` forward over `schedule` with no further
    /// placements.
    pub fn new(
        config: &'a SimConfig,
        kernel: &'a DiffusionKernel,
        belief: &BeliefGrid,
        dose: &DoseField,
        schedule: PhaseSchedule,
    ) -> Self {
        let turns = schedule.len();
        let mut beliefs = Vec::with_capacity(turns + 1);
        let mut doses = Vec::with_capacity(turns + 1);
        beliefs.push(belief.clone());
        doses.push(dose.clone());
        for s in 0..turns {
            let spread = schedule.spreads(s).then_some(config.spread_prob);
            let next_belief = beliefs[s].step(&doses[s], spread);
            let mut next_dose = doses[s].clone();
            next_dose.diffuse();
            beliefs.push(next_belief);
            doses.push(next_dose);
        }

        Self {
            config,
            kernel,
            schedule,
            beliefs,
            doses,
            undo: Vec::new(),
            marks: vec![false; belief.grid().padded_len()],
        }
    }

    /// Number of turns in the window.
    pub fn turns(&self) -> usize {
        self.schedule.len()
    }

    /// Spread phases of the window.
    pub fn schedule(&self) -> &PhaseSchedule {
        &self.schedule
    }

    /// Baseline belief at the start of window turn `s`.
    pub fn belief(&self, s: usize) -> &BeliefGrid {
        &self.beliefs[s]
    }

    /// Baseline dose at the start of window turn `s`.
    pub fn dose(&self, s: usize) -> &DoseField {
        &self.doses[s]
    }

    /// The cells a placement at `(x, y)` on window turn `t` would cure.
    ///
    /// A cell counts only while it may be infected and the baseline dose
    /// does not already cure it. The placement's contribution is read from
    /// the kernel; the baseline dose is discounted by the configured safety
    /// factor.
    pub fn make_cure_footprint(&self, x: u32, y: u32, t: usize) -> CureFootprint {
        let turns = self.turns();
        let grid = *self.beliefs[0].grid();
        let planner = &self.config.planner;
        let mut cured = vec![CuredSet::new(); turns];

        for cell in grid.diamond(x, y, planner.kernel_radius) {
            for (s, set) in cured.iter_mut().enumerate().skip(t) {
                let infected = self.beliefs[s].get(cell.index).infected;
                let dose = self.doses[s].get(cell.index);
                if infected <= planner.infection_epsilon || dose >= CURE_THRESHOLD {
                    continue;
                }
                let added = self.kernel.reach(cell.dx, cell.dy, (s - t) as u32);
                if added + dose * planner.dose_safety >= CURE_THRESHOLD {
                    set.push(cell.index);
                    break;
                }
            }
        }

        CureFootprint {
            x,
            y,
            turn: t,
            origin: grid.index(x, y),
            cured,
        }
    }

    /// Evaluate a set of footprints applied together.
    ///
    /// Returns, for every cell whose end-of-window belief changed, the
    /// gain in effective clean probability; only positive gains are kept.
    /// The baseline is left exactly as it was.
    pub fn simulate(&mut self, footprints: &[&CureFootprint]) -> ImprovementMap {
        let turns = self.turns();
        let grid = *self.beliefs[0].grid();
        let tolerance = self.config.planner.change_tolerance;
        let mut dirty: Vec<CellIndex> = Vec::new();
        let mut affected: Vec<CellIndex> = Vec::new();

        for s in 0..turns {
            for footprint in footprints {
                for &cell in footprint.cured_at(s) {
                    let before = self.beliefs[s].get(cell);
                    if before.infected > 0.0 {
                        self.undo.push(UndoEntry {
                            snapshot: s,
                            cell,
                            previous: before,
                        });
                        self.beliefs[s].set(cell, before.cured());
                        dirty.push(cell);
                    }
                }
            }
            if dirty.is_empty() {
                continue;
            }

            let spread = self
                .schedule
                .spreads(s)
                .then_some(self.config.spread_prob);
            affected.clear();
            for &cell in &dirty {
                mark(&mut self.marks, &mut affected, cell);
                if spread.is_some() {
                    for n in grid.neighbours(cell) {
                        if grid.is_interior(n) {
                            mark(&mut self.marks, &mut affected, n);
                        }
                    }
                }
            }
            for &cell in &affected {
                self.marks[cell] = false;
            }

            dirty.clear();
            for &cell in &affected {
                let next = self.beliefs[s].step_cell(cell, &self.doses[s], spread);
                let baseline = self.beliefs[s + 1].get(cell);
                if next.distance(&baseline) > tolerance {
                    self.undo.push(UndoEntry {
                        snapshot: s + 1,
                        cell,
                        previous: baseline,
                    });
                    self.beliefs[s + 1].set(cell, next);
                    dirty.push(cell);
                }
            }
        }

        let mut improvement = ImprovementMap::new();
        let end_dose = &self.doses[turns];
        for entry in self.undo.iter().filter(|e| e.snapshot == turns) {
            let cures = end_dose.cures(entry.cell);
            let after = self.beliefs[turns].get(entry.cell).effective_clean(cures);
            let gain = after - entry.previous.effective_clean(cures);
            if gain > 0.0 {
                improvement.insert(entry.cell, gain);
            }
        }

        while let Some(entry) = self.undo.pop() {
            self.beliefs[entry.snapshot].set(entry.cell, entry.previous);
        }
        improvement
    }
}

fn mark(marks: &mut [bool], list: &mut Vec<CellIndex>, cell: CellIndex) {
    if !marks[cell] {
        marks[cell] = true;
        list.push(cell);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cordon_test_utils::fixtures::observation;
    use proptest::prelude::*;

    struct Setup {
        config: SimConfig,
        kernel: DiffusionKernel,
        belief: BeliefGrid,
        dose: DoseField,
    }

    impl Setup {
        fn new(rows: &[&str], strength: u32, kill_time: u32, p: f64) -> Self {
            let obs = observation(rows);
            let config = SimConfig::new(obs.width(), obs.height(), strength, kill_time, p).unwrap();
            let kernel = DiffusionKernel::for_config(&config);
            let belief = BeliefGrid::from_observation(&obs).unwrap();
            let dose = DoseField::new(*belief.grid());
            Self {
                config,
                kernel,
                belief,
                dose,
            }
        }

        fn modeller(&self, turns: u32) -> Modeller<'_> {
            let schedule = PhaseSchedule::new(&self.config, 0, turns);
            Modeller::new(&self.config, &self.kernel, &self.belief, &self.dose, schedule)
        }
    }

    /// Every belief and dose value of every snapshot, as raw bits.
    fn snapshot_bits(m: &Modeller<'_>) -> Vec<u64> {
        (0..=m.turns())
            .flat_map(|s| {
                let b = m.belief(s);
                let mut bits: Vec<u64> = b
                    .grid()
                    .cells()
                    .flat_map(|i| [b.get(i).clean.to_bits(), b.get(i).infected.to_bits()])
                    .collect();
                bits.extend(m.dose(s).values().iter().map(|v| v.to_bits()));
                bits
            })
            .collect()
    }

    #[test]
    fn baseline_rolls_forward() {
        let setup = Setup::new(&["CVC"], 10, 5, 0.0);
        let m = setup.modeller(5);
        assert_eq!(m.turns(), 5);
        for s in 0..5 {
            assert_eq!(m.belief(s).at(1, 0), Distribution::INFECTED);
        }
        assert_eq!(m.belief(5).at(1, 0), Distribution::DEAD);
        assert_eq!(m.belief(5).at(0, 0), Distribution::CLEAN);
    }

    #[test]
    fn footprint_cures_at_earliest_turn() {
        let setup = Setup::new(&["CVC"], 10, 5, 0.0);
        let m = setup.modeller(5);
        let centre = setup.belief.grid().index(1, 0);

        let direct = m.make_cure_footprint(1, 0, 0);
        assert_eq!(direct.cured_at(0), &[centre]);
        assert_eq!(direct.size(), 1);

        // A neighbour's dose arrives one turn later.
        let side = m.make_cure_footprint(0, 0, 0);
        assert!(side.cured_at(0).is_empty());
        assert_eq!(side.cured_at(1), &[centre]);
        assert!(!side.dominates(&direct));
        assert!(!direct.dominates(&side));
        assert!(side.dominates(&m.make_cure_footprint(2, 0, 0)));
    }

    #[test]
    fn footprint_on_clean_grid_is_empty() {
        let setup = Setup::new(&["CCC", "CXC"], 10, 3, 0.5);
        let m = setup.modeller(3);
        for y in 0..2 {
            for x in 0..3 {
                assert!(m.make_cure_footprint(x, y, 0).is_empty());
            }
        }
    }

    #[test]
    fn weak_dose_needs_time_or_nothing() {
        // Strength 1 cures its own cell immediately but is diluted to 0.2
        // on the neighbour, which never reaches the threshold.
        let setup = Setup::new(&["CVC"], 1, 5, 0.0);
        let m = setup.modeller(5);
        assert!(m.make_cure_footprint(0, 0, 0).is_empty());
        assert_eq!(m.make_cure_footprint(1, 0, 2).cured_at(2).len(), 1);
    }

    #[test]
    fn curing_the_source_saves_it() {
        let setup = Setup::new(&["CVC"], 10, 5, 0.0);
        let mut m = setup.modeller(5);
        let fp = m.make_cure_footprint(1, 0, 0);
        let gains = m.simulate(&[&fp]);
        let centre = setup.belief.grid().index(1, 0);
        assert_eq!(gains.len(), 1);
        assert!((gains[&centre] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn curing_the_source_protects_neighbours() {
        let setup = Setup::new(&["CCVCC"], 10, 2, 0.5);
        let mut m = setup.modeller(2);
        let fp = m.make_cure_footprint(2, 0, 0);
        let gains = m.simulate(&[&fp]);
        let grid = *setup.belief.grid();
        assert!((gains[&grid.index(2, 0)] - 1.0).abs() < 1e-12);
        assert!((gains[&grid.index(1, 0)] - 0.5).abs() < 1e-12);
        assert!((gains[&grid.index(3, 0)] - 0.5).abs() < 1e-12);
        assert!(!gains.contains_key(&grid.index(0, 0)));
    }

    #[test]
    fn empty_simulation_changes_nothing() {
        let setup = Setup::new(&["CVC"], 10, 5, 0.3);
        let mut m = setup.modeller(5);
        assert!(m.simulate(&[]).is_empty());
        // Too late for the neighbour's dose to arrive.
        let nothing = m.make_cure_footprint(0, 0, 4);
        assert!(nothing.is_empty());
        assert!(m.simulate(&[&nothing]).is_empty());
    }

    #[test]
    fn superset_check() {
        assert!(is_superset(&[1, 3, 5, 7], &[3, 7]));
        assert!(is_superset(&[1, 3], &[]));
        assert!(!is_superset(&[1, 3, 5], &[2]));
        assert!(!is_superset(&[3], &[3, 4]));
    }

    fn arb_rows() -> impl Strategy<Value = Vec<String>> {
        (2usize..7, 2usize..7).prop_flat_map(|(w, h)| {
            prop::collection::vec(
                prop::sample::select(vec!['C', 'C', 'C', 'V', 'X']),
                w * h,
            )
            .prop_map(move |cells| {
                cells
                    .chunks(w)
                    .map(|row| row.iter().collect::<String>())
                    .collect()
            })
        })
    }

    proptest! {
        #[test]
        fn simulate_restores_the_baseline(
            rows in arb_rows(),
            strength in 1u32..30,
            kill_time in 1u32..5,
            p in 0.0f64..=1.0,
            picks in prop::collection::vec((0u32..7, 0u32..7, 0usize..4), 0..4),
            earlier in prop::collection::vec((0u32..7, 0u32..7, 0.0f64..3.0), 0..3),
        ) {
            let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
            let mut setup = Setup::new(&rows, strength, kill_time, p);
            let (w, h) = (setup.config.width, setup.config.height);
            for &(x, y, amount) in &earlier {
                let index = setup.belief.grid().index(x % w, y % h);
                setup.dose.add(index, amount);
            }
            let mut m = setup.modeller(setup.config.observation_period());
            let before = snapshot_bits(&m);

            let footprints: Vec<CureFootprint> = picks
                .iter()
                .map(|&(x, y, t)| m.make_cure_footprint(x % w, y % h, t % m.turns()))
                .collect();
            let refs: Vec<&CureFootprint> = footprints.iter().collect();
            let gains = m.simulate(&refs);
            prop_assert_eq!(before, snapshot_bits(&m));
            for (_, gain) in &gains {
                prop_assert!(*gain > 0.0);
                prop_assert!(*gain <= 1.0 + 1e-9);
            }
            // Simulating again gives the same answer.
            prop_assert_eq!(gains, m.simulate(&refs));
        }

        #[test]
        fn dominance_is_antisymmetric(
            rows in arb_rows(),
            strength in 1u32..30,
            kill_time in 1u32..5,
        ) {
            let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
            let setup = Setup::new(&rows, strength, kill_time, 0.5);
            let m = setup.modeller(setup.config.observation_period());
            let grid = *setup.belief.grid();
            let footprints: Vec<CureFootprint> = (0..m.turns())
                .flat_map(|t| grid.cells().map(move |i| (i, t)))
                .map(|(i, t)| {
                    let (x, y) = grid.coords(i);
                    m.make_cure_footprint(x, y, t)
                })
                .collect();
            for a in &footprints {
                prop_assert!(a.dominates(a));
                for b in &footprints {
                    if a.dominates(b) && b.dominates(a) {
                        for s in 0..a.turns() {
                            prop_assert_eq!(a.cured_at(s), b.cured_at(s));
                        }
                    }
                }
            }
        }
    }
}
