//! Cordon: an agent that contains an outbreak on a grid by placing doses
//! of a diffusing cure.
//!
//! This is the top-level facade crate. It re-exports the public API of the
//! sub-crates and wires them into [`play`], which runs one game over any
//! reader/writer pair speaking the judge protocol. The `cordon` binary
//! calls it with stdin and stdout.
//!
//! # Quick start
//!
//! ```rust
//! use cordon::prelude::*;
//!
//! // The judge's opening message, then its reply to our one ADDMED.
//! let judge_says = b"1\nCVC\n10\n5\n0\n0\n";
//! let mut we_say = Vec::new();
//! let summary = cordon::play(&judge_says[..], &mut we_say).unwrap();
//! assert_eq!(summary.outcome, RunOutcome::Contained);
//! assert_eq!(String::from_utf8(we_say).unwrap(), "ADDMED\n1 0\nEND\n");
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `cordon-core` | Config, observations, errors, the `Judge` trait |
//! | [`space`] | `cordon-space` | Padded grid, neighbourhoods, diamonds |
//! | [`model`] | `cordon-model` | Diffusion, belief, footprints, simulation |
//! | [`engine`] | `cordon-engine` | Planner and run loop |
//! | [`protocol`] | `cordon-protocol` | Text protocol over any reader/writer |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

use std::io::{BufRead, Write};

/// Core types and errors (`cordon-core`).
pub use cordon_core as types;

/// Grid geometry (`cordon-space`).
pub use cordon_space as space;

/// Diffusion, belief, and footprint models (`cordon-model`).
pub use cordon_model as model;

/// Planner and run loop (`cordon-engine`).
pub use cordon_engine as engine;

/// The judge's text protocol (`cordon-protocol`).
pub use cordon_protocol as protocol;

pub mod logging;

/// Common imports.
pub mod prelude {
    pub use cordon_core::{
        CellState, Judge, Observation, PlannerConfig, ProtocolError, SimConfig,
    };
    pub use cordon_engine::{Run, RunError, RunOutcome, RunSummary};
    pub use cordon_protocol::LineJudge;
}

use cordon_engine::{Run, RunError, RunSummary};
use cordon_protocol::LineJudge;

/// Play one game: read the handshake from `reader`, then exchange
/// commands and replies until the outbreak is contained or time runs out.
pub fn play<R: BufRead, W: Write>(reader: R, writer: W) -> Result<RunSummary, RunError> {
    let mut judge = LineJudge::new(reader, writer);
    let handshake = judge.handshake()?;
    let config = handshake.config()?;
    tracing::info!(
        width = config.width,
        height = config.height,
        med_strength = config.med_strength,
        kill_time = config.kill_time,
        spread_prob = config.spread_prob,
        infected = handshake.observation.count(cordon_core::CellState::Infected),
        "handshake"
    );
    let mut run = Run::new(config, &handshake.observation)?;
    run.play(&mut judge)
}
