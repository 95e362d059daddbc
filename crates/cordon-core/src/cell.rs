//! Ground-truth cell states and judge observations.

use std::fmt;

use crate::error::ProtocolError;

/// The true state of a single grid cell, as revealed by an observation.
///
/// `Dead` is absorbing: a dead cell never becomes clean or infected again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellState {
    /// Healthy tissue (`C`).
    Clean,
    /// Carries the infection (`V`).
    Infected,
    /// Consumed by the infection (`X`).
    Dead,
}

impl CellState {
    /// Parse a protocol symbol (`C`, `V` or `X`).
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'C' => Some(Self::Clean),
            'V' => Some(Self::Infected),
            'X' => Some(Self::Dead),
            _ => None,
        }
    }

    /// The protocol symbol for this state.
    pub fn symbol(self) -> char {
        match self {
            Self::Clean => 'C',
            Self::Infected => 'V',
            Self::Dead => 'X',
        }
    }
}

impl fmt::Display for CellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => write!(f, "clean"),
            Self::Infected => write!(f, "infected"),
            Self::Dead => write!(f, "dead"),
        }
    }
}

/// A ground-truth snapshot of the whole grid.
///
/// Cells are stored row-major: `(x, y)` lives at `y * width + x`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Observation {
    width: u32,
    height: u32,
    cells: Vec<CellState>,
}

impl Observation {
    /// Build an observation from protocol rows (one string per row).
    ///
    /// Every row must be non-empty, all rows must share one width, and
    /// every symbol must be one of `C`, `V`, `X`.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, ProtocolError> {
        if rows.is_empty() {
            return Err(ProtocolError::MalformedGrid {
                reason: "grid has no rows".into(),
            });
        }
        let width = rows[0].as_ref().chars().count();
        if width == 0 {
            return Err(ProtocolError::MalformedGrid {
                reason: "grid rows are empty".into(),
            });
        }

        let mut cells = Vec::with_capacity(width * rows.len());
        for (row, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            let len = line.chars().count();
            if len != width {
                return Err(ProtocolError::MalformedGrid {
                    reason: format!("row {row} has width {len}, expected {width}"),
                });
            }
            for (col, symbol) in line.chars().enumerate() {
                let state = CellState::from_symbol(symbol)
                    .ok_or(ProtocolError::UnknownSymbol { symbol, row, col })?;
                cells.push(state);
            }
        }

        Ok(Self {
            width: width as u32,
            height: rows.len() as u32,
            cells,
        })
    }

    /// Grid width (number of columns).
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Grid height (number of rows).
    pub fn height(&self) -> u32 {
        self.height
    }

    /// State of the cell at column `x`, row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the grid.
    pub fn get(&self, x: u32, y: u32) -> CellState {
        assert!(x < self.width && y < self.height, "({x}, {y}) outside grid");
        self.cells[(y * self.width + x) as usize]
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    /// Whether any cell is infected.
    pub fn has_infection(&self) -> bool {
        self.cells.contains(&CellState::Infected)
    }

    /// Number of cells in the given state.
    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|&&c| c == state).count()
    }

    /// Render back to protocol rows.
    pub fn rows(&self) -> Vec<String> {
        self.cells
            .chunks(self.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect())
            .collect()
    }
}
