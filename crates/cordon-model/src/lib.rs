//! Belief and diffusion models for the Cordon outbreak agent.
//!
//! Leaves first:
//!
//! 1. [`diffusion`]: the exact per-turn dose step ([`DoseField`]) and the
//!    precomputed point-source response ([`DiffusionKernel`]).
//! 2. [`belief`]: per-cell clean/infected/dead distributions and their
//!    evolution ([`BeliefGrid`]).
//! 3. [`schedule`]: which turns of a window are spread phases.
//! 4. [`modeller`]: rolls the above forward over a planning window and
//!    evaluates hypothetical placements against that baseline.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod belief;
pub mod diffusion;
pub mod modeller;
pub mod schedule;

pub use belief::{BeliefGrid, Distribution};
pub use diffusion::{DiffusionKernel, DoseField};
pub use modeller::{CureFootprint, ImprovementMap, Modeller};
pub use schedule::PhaseSchedule;
