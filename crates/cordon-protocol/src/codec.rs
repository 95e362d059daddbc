//! Token-level encoding and decoding.
//!
//! The judge writes whitespace-separated tokens; a grid is its height
//! followed by that many row strings. The agent writes one command per
//! line, with its arguments on the next line.

use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::str::FromStr;

use cordon_core::{ConfigError, Observation, ProtocolError, SimConfig};

// ── Reading ────────────────────────────────────────────────────────

/// Splits a line-based stream into whitespace-separated tokens.
///
/// Generic over `R: BufRead` so tests can use `&[u8]` and production
/// code can use a locked stdin.
pub struct TokenReader<R: BufRead> {
    reader: R,
    line: String,
    pending: VecDeque<String>,
}

impl<R: BufRead> TokenReader<R> {
    /// Wrap a reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            pending: VecDeque::new(),
        }
    }

    /// The next token; `expected` names it in errors.
    pub fn next_token(&mut self, expected: &'static str) -> Result<String, ProtocolError> {
        while self.pending.is_empty() {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Err(ProtocolError::UnexpectedEof { expected });
            }
            self.pending
                .extend(self.line.split_whitespace().map(str::to_owned));
        }
        self.pending
            .pop_front()
            .ok_or(ProtocolError::UnexpectedEof { expected })
    }

    /// The next token parsed as `T`.
    pub fn parse<T: FromStr>(&mut self, expected: &'static str) -> Result<T, ProtocolError> {
        let token = self.next_token(expected)?;
        token
            .parse()
            .map_err(|_| ProtocolError::MalformedToken {
                expected,
                found: token,
            })
    }

    /// A grid: its height, then that many rows.
    pub fn read_grid(&mut self) -> Result<Observation, ProtocolError> {
        let height: usize = self.parse("grid height")?;
        if height == 0 {
            return Err(ProtocolError::MalformedGrid {
                reason: "grid height is zero".into(),
            });
        }
        let rows = (0..height)
            .map(|_| self.next_token("grid row"))
            .collect::<Result<Vec<_>, _>>()?;
        Observation::from_rows(&rows)
    }

    /// The opening message: the grid, then dose strength, kill time and
    /// spread probability.
    pub fn read_handshake(&mut self) -> Result<Handshake, ProtocolError> {
        let observation = self.read_grid()?;
        let med_strength = self.parse("med strength")?;
        let kill_time = self.parse("kill time")?;
        let spread_prob = self.parse("spread probability")?;
        Ok(Handshake {
            observation,
            med_strength,
            kill_time,
            spread_prob,
        })
    }
}

/// Everything the judge sends before the first command.
#[derive(Clone, Debug, PartialEq)]
pub struct Handshake {
    /// The starting grid.
    pub observation: Observation,
    /// Dose added by one placement.
    pub med_strength: u32,
    /// Turns between infection and death.
    pub kill_time: u32,
    /// Chance a dying cell infects each clean neighbour.
    pub spread_prob: f64,
}

impl Handshake {
    /// Validated run parameters with default planner tuning.
    pub fn config(&self) -> Result<SimConfig, ConfigError> {
        SimConfig::new(
            self.observation.width(),
            self.observation.height(),
            self.med_strength,
            self.kill_time,
            self.spread_prob,
        )
    }
}

// ── Writing ────────────────────────────────────────────────────────

/// A command sent to the judge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Request {
    /// Place a dose on column `x`, row `y`.
    AddMed {
        /// Column.
        x: u32,
        /// Row.
        y: u32,
    },
    /// Take the grid; costs one turn.
    Observe,
    /// Let `n` turns pass.
    WaitTime(u32),
    /// No more commands.
    End,
}

impl Request {
    /// The command keyword.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddMed { .. } => "ADDMED",
            Self::Observe => "OBSERVE",
            Self::WaitTime(_) => "WAITTIME",
            Self::End => "END",
        }
    }

    /// Write the command in wire form.
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<(), ProtocolError> {
        writeln!(w, "{}", self.name())?;
        match self {
            Self::AddMed { x, y } => writeln!(w, "{x} {y}")?,
            Self::WaitTime(n) => writeln!(w, "{n}")?,
            Self::Observe | Self::End => {}
        }
        Ok(())
    }
}
