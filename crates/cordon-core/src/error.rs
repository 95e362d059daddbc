//! Error types for the Cordon agent.
//!
//! Organized by subsystem: configuration (rejected at start-up), the
//! judge protocol, and model/reality divergence. None of these are
//! retried; every one of them ends the run.

use std::error::Error;
use std::fmt;
use std::io;

use crate::cell::CellState;

/// Degenerate run parameters, detected by [`SimConfig::validate()`](crate::SimConfig::validate).
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// The grid has no cells.
    EmptyGrid {
        /// Configured width.
        width: u32,
        /// Configured height.
        height: u32,
    },
    /// `spread_prob` is NaN or outside `[0, 1]`.
    InvalidSpreadProb {
        /// The invalid value.
        value: f64,
    },
    /// `kill_time` is zero, which would make the phase schedule undefined.
    ZeroKillTime,
    /// `med_strength` is zero, so no placement could ever cure a cell.
    ZeroMedStrength,
    /// A [`PlannerConfig`](crate::PlannerConfig) knob is out of range.
    InvalidPlanner {
        /// Which knob and why.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid { width, height } => {
                write!(f, "grid {width}x{height} has no cells")
            }
            Self::InvalidSpreadProb { value } => {
                write!(f, "spread_prob must be within [0, 1], got {value}")
            }
            Self::ZeroKillTime => write!(f, "kill_time must be at least 1"),
            Self::ZeroMedStrength => write!(f, "med_strength must be at least 1"),
            Self::InvalidPlanner { reason } => write!(f, "invalid planner config: {reason}"),
        }
    }
}

impl Error for ConfigError {}

/// Failures talking to the judge.
///
/// The protocol has no retry semantics, so every variant is fatal.
#[derive(Debug)]
pub enum ProtocolError {
    /// Reading from or writing to the judge failed.
    Io(io::Error),
    /// The judge closed its output while a value was still expected.
    UnexpectedEof {
        /// What was being read.
        expected: &'static str,
    },
    /// A token could not be parsed as the expected value.
    MalformedToken {
        /// What was being read.
        expected: &'static str,
        /// The offending token.
        found: String,
    },
    /// A grid row contained a symbol other than `C`, `V`, `X`.
    UnknownSymbol {
        /// The offending symbol.
        symbol: char,
        /// Row of the symbol.
        row: usize,
        /// Column of the symbol.
        col: usize,
    },
    /// A grid had the wrong shape.
    MalformedGrid {
        /// Description of the shape problem.
        reason: String,
    },
    /// The judge answered a command with a non-zero status.
    Rejected {
        /// The command that was rejected.
        command: &'static str,
        /// The status the judge replied with.
        status: i64,
    },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::UnexpectedEof { expected } => {
                write!(f, "unexpected end of input while reading {expected}")
            }
            Self::MalformedToken { expected, found } => {
                write!(f, "expected {expected}, found {found:?}")
            }
            Self::UnknownSymbol { symbol, row, col } => {
                write!(f, "unknown cell symbol {symbol:?} at row {row}, column {col}")
            }
            Self::MalformedGrid { reason } => write!(f, "malformed grid: {reason}"),
            Self::Rejected { command, status } => {
                write!(f, "judge rejected {command} with status {status}")
            }
        }
    }
}

impl Error for ProtocolError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ProtocolError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// The belief contradicts an observation.
///
/// Raised when the predicted probability of the observed class is
/// (almost) zero, or the prediction is (almost) certain of a different
/// class. This always indicates a modelling bug.
#[derive(Clone, Debug, PartialEq)]
pub struct DivergenceError {
    /// Column of the first contradicting cell.
    pub x: u32,
    /// Row of the first contradicting cell.
    pub y: u32,
    /// What the judge reported.
    pub observed: CellState,
    /// Predicted clean probability.
    pub clean: f64,
    /// Predicted infection probability.
    pub infected: f64,
}

impl fmt::Display for DivergenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "belief diverged at ({}, {}): observed {}, predicted clean={:.3e} infected={:.3e} dead={:.3e}",
            self.x,
            self.y,
            self.observed,
            self.clean,
            self.infected,
            1.0 - self.clean - self.infected,
        )
    }
}

impl Error for DivergenceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_is_chained() {
        let err = ProtocolError::from(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn rejection_names_the_command() {
        let err = ProtocolError::Rejected {
            command: "ADDMED",
            status: -1,
        };
        assert_eq!(err.to_string(), "judge rejected ADDMED with status -1");
    }

    #[test]
    fn divergence_reports_dead_mass() {
        let err = DivergenceError {
            x: 1,
            y: 2,
            observed: CellState::Infected,
            clean: 0.25,
            infected: 0.0,
        };
        let text = err.to_string();
        assert!(text.contains("(1, 2)"));
        assert!(text.contains("observed infected"));
        assert!(text.contains("dead=7.500e-1"));
    }
}
