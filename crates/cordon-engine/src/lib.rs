//! Planning and play for the Cordon outbreak agent.
//!
//! [`Planner`] picks placements for one observation window on top of a
//! [`Modeller`](cordon_model::Modeller) baseline. [`Run`] drives the whole
//! game against a [`Judge`](cordon_core::Judge): plan, execute, observe,
//! repeat until the infection is gone or time runs out.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod metrics;
pub mod planner;
pub mod run;

pub use error::RunError;
pub use metrics::RunMetrics;
pub use planner::{Action, Candidate, Plan, PlanReport, Planner, Segment};
pub use run::{Run, RunOutcome, RunPhase, RunSummary};
