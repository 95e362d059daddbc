//! Test utilities for Cordon development.
//!
//! - [`fixtures`]: grid and configuration builders.
//! - [`SimulatedJudge`]: an in-process judge that plays the real game
//!   rules from a seeded RNG and records every call it receives.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
mod judge;

pub use judge::{JudgeCall, SimulatedJudge, MAX_TIME};
