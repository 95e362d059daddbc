//! Core types and traits for the Cordon outbreak agent.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every other crate in the workspace: cell
//! states and observations, the run configuration, error types, and
//! the [`Judge`] trait through which the agent talks to the game.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cell;
pub mod config;
pub mod error;
pub mod traits;

pub use cell::{CellState, Observation};
pub use config::{PlannerConfig, SimConfig, CURE_THRESHOLD, DIFFUSION_RATE};
pub use error::{ConfigError, DivergenceError, ProtocolError};
pub use traits::Judge;
