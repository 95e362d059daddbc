//! Padded 2D grid with 4-connected neighbourhood.

use crate::error::SpaceError;

/// Flat index into a padded grid buffer.
pub type CellIndex = usize;

/// A `width x height` grid stored with a one-cell border.
///
/// Column `x` and row `y` map to `(y + 1) * stride + (x + 1)` where
/// `stride = width + 2`. Buffers sized with [`padded_len`](Grid::padded_len)
/// therefore hold the border cells too; callers keep them at their
/// neutral value (dead belief, zero dose) and never write them.
///
/// Distance is Manhattan (L1), which matches graph distance under
/// 4-connectivity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grid {
    width: u32,
    height: u32,
}

impl Grid {
    /// Maximum dimension: padded coordinates must fit in `i32`.
    pub const MAX_DIM: u32 = (i32::MAX - 2) as u32;

    /// Create a grid with `width * height` cells.
    ///
    /// Returns `Err(SpaceError::EmptySpace)` if either dimension is 0, or
    /// `Err(SpaceError::DimensionTooLarge)` if either exceeds [`Grid::MAX_DIM`].
    pub fn new(width: u32, height: u32) -> Result<Self, SpaceError> {
        if width == 0 || height == 0 {
            return Err(SpaceError::EmptySpace);
        }
        for (name, value) in [("width", width), ("height", height)] {
            if value > Self::MAX_DIM {
                return Err(SpaceError::DimensionTooLarge {
                    name,
                    value,
                    max: Self::MAX_DIM,
                });
            }
        }
        Ok(Self { width, height })
    }

    /// Number of columns.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of in-grid cells (border excluded).
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Distance between vertically adjacent cells in the padded buffer.
    pub fn stride(&self) -> usize {
        self.width as usize + 2
    }

    /// Length of a padded buffer, border included.
    pub fn padded_len(&self) -> usize {
        self.stride() * (self.height as usize + 2)
    }

    /// Padded index of in-grid cell `(x, y)`.
    ///
    /// Debug builds assert the coordinate is in the grid.
    pub fn index(&self, x: u32, y: u32) -> CellIndex {
        debug_assert!(x < self.width && y < self.height, "({x}, {y}) outside grid");
        (y as usize + 1) * self.stride() + x as usize + 1
    }

    /// Padded index of `(x, y)`, or `None` if it lies outside the grid.
    pub fn checked_index(&self, x: i64, y: i64) -> Option<CellIndex> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        Some(self.index(x as u32, y as u32))
    }

    /// Like [`checked_index`](Grid::checked_index) but with a descriptive error.
    pub fn try_index(&self, x: i64, y: i64) -> Result<CellIndex, SpaceError> {
        self.checked_index(x, y).ok_or(SpaceError::CoordOutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        })
    }

    /// Column and row of a padded index.
    ///
    /// Only meaningful for in-grid indices.
    pub fn coords(&self, index: CellIndex) -> (u32, u32) {
        let stride = self.stride();
        ((index % stride - 1) as u32, (index / stride - 1) as u32)
    }

    /// Whether a padded index lies inside the playing field.
    pub fn is_interior(&self, index: CellIndex) -> bool {
        let stride = self.stride();
        let (col, row) = (index % stride, index / stride);
        col >= 1 && col <= self.width as usize && row >= 1 && row <= self.height as usize
    }

    /// The four neighbours of an in-grid cell: north, south, west, east.
    ///
    /// Border cells are returned as-is; the padding guarantees they exist.
    pub fn neighbours(&self, index: CellIndex) -> [CellIndex; 4] {
        let stride = self.stride();
        [index - stride, index + stride, index - 1, index + 1]
    }

    /// Manhattan distance between two in-grid cells.
    pub fn manhattan(&self, a: CellIndex, b: CellIndex) -> u32 {
        let (ax, ay) = self.coords(a);
        let (bx, by) = self.coords(b);
        ax.abs_diff(bx) + ay.abs_diff(by)
    }

    /// In-grid padded indices in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellIndex> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| self.index(x, y)))
    }

    /// In-grid cells within Manhattan distance `radius` of `(x, y)`,
    /// in row-major (ascending index) order.
    pub fn diamond(&self, x: u32, y: u32, radius: u32) -> Diamond<'_> {
        let radius = i64::from(radius);
        Diamond {
            grid: self,
            cx: i64::from(x),
            cy: i64::from(y),
            radius,
            dx: 0,
            dy: -radius,
        }
    }
}

/// One cell yielded by [`Grid::diamond`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiamondCell {
    /// Column offset from the centre.
    pub dx: i32,
    /// Row offset from the centre.
    pub dy: i32,
    /// Padded index of the cell.
    pub index: CellIndex,
}

/// Iterator over a clipped Manhattan diamond. See [`Grid::diamond`].
#[derive(Clone, Debug)]
pub struct Diamond<'g> {
    grid: &'g Grid,
    cx: i64,
    cy: i64,
    radius: i64,
    dx: i64,
    dy: i64,
}

impl Iterator for Diamond<'_> {
    type Item = DiamondCell;

    fn next(&mut self) -> Option<DiamondCell> {
        while self.dy <= self.radius {
            let span = self.radius - self.dy.abs();
            if self.dx > span {
                self.dy += 1;
                self.dx = -(self.radius - self.dy.abs());
                continue;
            }
            let (dx, dy) = (self.dx, self.dy);
            self.dx += 1;
            if let Some(index) = self.grid.checked_index(self.cx + dx, self.cy + dy) {
                return Some(DiamondCell {
                    dx: dx as i32,
                    dy: dy as i32,
                    index,
                });
            }
        }
        None
    }
}
