//! In-process judge.

use cordon_core::{CellState, Judge, Observation, ProtocolError, SimConfig};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Turn limit the judge enforces.
pub const MAX_TIME: u32 = 10_000;

const CLEAN: i32 = 0;
const DEAD: i32 = -1;
const DYING: i32 = -2;

/// One call received by a [`SimulatedJudge`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JudgeCall {
    AddMed { x: u32, y: u32 },
    Observe,
    WaitTime(u32),
    Finish,
}

/// Plays the game rules against a seeded RNG.
///
/// Cell state uses the judge's own encoding: `0` clean, `-1` dead, a
/// positive value is an infection with that many turns left. Each turn
/// cures dosed cells, advances infection timers (dying cells infect
/// clean neighbours), then diffuses the dose.
pub struct SimulatedJudge {
    width: usize,
    height: usize,
    virus: Vec<i32>,
    med: Vec<f64>,
    med_strength: u32,
    kill_time: u32,
    spread_prob: f64,
    rng: ChaCha8Rng,
    time: u32,
    max_time: u32,
    doses: u32,
    calls: Vec<JudgeCall>,
}

impl SimulatedJudge {
    /// A judge starting from `rows`, every infection on a full timer.
    pub fn new(rows: &[&str], med_strength: u32, kill_time: u32, spread_prob: f64, seed: u64) -> Self {
        let obs = crate::fixtures::observation(rows);
        let virus = obs
            .cells()
            .iter()
            .map(|state| match state {
                CellState::Clean => CLEAN,
                CellState::Infected => kill_time as i32,
                CellState::Dead => DEAD,
            })
            .collect();
        Self {
            width: obs.width() as usize,
            height: obs.height() as usize,
            virus,
            med: vec![0.0; obs.cells().len()],
            med_strength,
            kill_time,
            spread_prob,
            rng: ChaCha8Rng::seed_from_u64(seed),
            time: 0,
            max_time: MAX_TIME,
            doses: 0,
            calls: Vec::new(),
        }
    }

    /// Lower the turn limit.
    pub fn with_max_time(mut self, max_time: u32) -> Self {
        self.max_time = max_time;
        self
    }

    /// The config an agent would derive from the handshake.
    pub fn config(&self) -> SimConfig {
        SimConfig::new(
            self.width as u32,
            self.height as u32,
            self.med_strength,
            self.kill_time,
            self.spread_prob,
        )
        .expect("judge parameters must be valid")
    }

    /// The current grid without consuming a turn.
    pub fn observation(&self) -> Observation {
        let rows: Vec<String> = self
            .virus
            .chunks(self.width)
            .map(|row| {
                row.iter()
                    .map(|&v| match v {
                        CLEAN => 'C',
                        DEAD => 'X',
                        _ => 'V',
                    })
                    .collect()
            })
            .collect();
        Observation::from_rows(&rows).expect("judge grid is always well formed")
    }

    /// Calls received so far.
    pub fn calls(&self) -> &[JudgeCall] {
        &self.calls
    }

    /// Turns played.
    pub fn elapsed(&self) -> u32 {
        self.time
    }

    /// Doses placed.
    pub fn dose_count(&self) -> u32 {
        self.doses
    }

    /// Dose at column `x`, row `y`.
    pub fn med(&self, x: u32, y: u32) -> f64 {
        self.med[y as usize * self.width + x as usize]
    }

    /// Whether no cell is infected.
    pub fn is_contained(&self) -> bool {
        self.virus.iter().all(|&v| v <= CLEAN)
    }

    /// Number of clean cells.
    pub fn clean_count(&self) -> usize {
        self.virus.iter().filter(|&&v| v == CLEAN).count()
    }

    /// Play out the infection with no more doses, as the judge does after
    /// the agent finishes.
    pub fn run_to_completion(&mut self) {
        while self.time < self.max_time && !self.is_contained() {
            self.increment_time();
        }
    }

    /// Score of the finished game: clean cells less half a cell per dose,
    /// per elapsed turn.
    pub fn score(&mut self) -> f64 {
        self.run_to_completion();
        let healthy = self.clean_count() as f64 - f64::from(self.doses) * 0.5;
        (healthy / f64::from(self.time.max(1))).max(0.0)
    }

    fn increment_time(&mut self) {
        self.time += 1;
        self.process_meds();
        self.process_viruses();
        self.diffuse();
    }

    fn process_meds(&mut self) {
        for (virus, &med) in self.virus.iter_mut().zip(&self.med) {
            if *virus > CLEAN && med >= 1.0 {
                *virus = CLEAN;
            }
        }
    }

    fn process_viruses(&mut self) {
        for v in self.virus.iter_mut().filter(|v| **v > CLEAN) {
            *v -= 1;
            if *v == 0 {
                *v = DYING;
            }
        }
        for y in 0..self.height {
            for x in 0..self.width {
                if self.virus[y * self.width + x] != DYING {
                    continue;
                }
                self.virus[y * self.width + x] = DEAD;
                let mut neighbours = Vec::with_capacity(4);
                if x > 0 {
                    neighbours.push(y * self.width + x - 1);
                }
                if x + 1 < self.width {
                    neighbours.push(y * self.width + x + 1);
                }
                if y > 0 {
                    neighbours.push((y - 1) * self.width + x);
                }
                if y + 1 < self.height {
                    neighbours.push((y + 1) * self.width + x);
                }
                for n in neighbours {
                    if self.virus[n] == CLEAN && self.rng.random::<f64>() < self.spread_prob {
                        self.virus[n] = self.kill_time as i32;
                    }
                }
            }
        }
    }

    fn diffuse(&mut self) {
        let w = self.width;
        let mut delta = vec![0.0; self.med.len()];
        for y in 0..self.height {
            for x in 0..w {
                let i = y * w + x;
                if x > 0 {
                    delta[i - 1] += (self.med[i] - self.med[i - 1]) * 0.2;
                    delta[i] += (self.med[i - 1] - self.med[i]) * 0.2;
                }
                if y > 0 {
                    delta[i - w] += (self.med[i] - self.med[i - w]) * 0.2;
                    delta[i] += (self.med[i - w] - self.med[i]) * 0.2;
                }
            }
        }
        for (m, d) in self.med.iter_mut().zip(delta) {
            *m += d;
        }
    }
}

impl Judge for SimulatedJudge {
    fn add_med(&mut self, x: u32, y: u32) -> Result<(), ProtocolError> {
        self.calls.push(JudgeCall::AddMed { x, y });
        if x as usize >= self.width || y as usize >= self.height || self.time >= self.max_time {
            return Err(ProtocolError::Rejected {
                command: "ADDMED",
                status: -1,
            });
        }
        self.med[y as usize * self.width + x as usize] += f64::from(self.med_strength);
        self.doses += 1;
        self.increment_time();
        Ok(())
    }

    fn observe(&mut self) -> Result<Observation, ProtocolError> {
        self.calls.push(JudgeCall::Observe);
        let obs = self.observation();
        self.increment_time();
        Ok(obs)
    }

    fn wait_time(&mut self, turns: u32) -> Result<(), ProtocolError> {
        self.calls.push(JudgeCall::WaitTime(turns));
        if turns == 0 || self.time + turns > self.max_time {
            return Err(ProtocolError::Rejected {
                command: "WAITTIME",
                status: -1,
            });
        }
        for _ in 0..turns {
            self.increment_time();
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ProtocolError> {
        self.calls.push(JudgeCall::Finish);
        Ok(())
    }
}
