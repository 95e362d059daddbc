//! Error types for grid construction and coordinate lookups.

use std::fmt;

/// Errors arising from grid construction or spatial queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpaceError {
    /// Attempted to construct a grid with zero cells.
    EmptySpace,
    /// A dimension exceeds the supported maximum.
    DimensionTooLarge {
        /// Name of the dimension (`"width"` or `"height"`).
        name: &'static str,
        /// The value that was too large.
        value: u32,
        /// The maximum allowed value.
        max: u32,
    },
    /// A coordinate is outside the grid.
    CoordOutOfBounds {
        /// Column of the offending coordinate.
        x: i64,
        /// Row of the offending coordinate.
        y: i64,
        /// Grid width.
        width: u32,
        /// Grid height.
        height: u32,
    },
}

impl fmt::Display for SpaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySpace => write!(f, "grid must have at least one cell"),
            Self::DimensionTooLarge { name, value, max } => {
                write!(f, "{name} {value} exceeds maximum {max}")
            }
            Self::CoordOutOfBounds {
                x,
                y,
                width,
                height,
            } => write!(
                f,
                "coordinate ({x}, {y}) out of bounds: [0, {width}) x [0, {height})"
            ),
        }
    }
}

impl std::error::Error for SpaceError {}
