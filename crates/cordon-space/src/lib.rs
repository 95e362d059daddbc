//! Grid geometry for Cordon.
//!
//! Every spatial structure in the agent (belief, dose, snapshots) is
//! stored on the same padded row-major layout described by [`Grid`]:
//! the `W x H` playing field surrounded by a one-cell border. The
//! border lets every in-grid cell address four neighbours without
//! bounds checks.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod grid;

pub use error::SpaceError;
pub use grid::{CellIndex, Diamond, DiamondCell, Grid};
