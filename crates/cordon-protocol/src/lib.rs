//! The judge's line-oriented text protocol.
//!
//! [`codec`] handles tokens, grids, and command encoding. [`LineJudge`]
//! wraps a reader and writer pair (stdin and stdout in production, byte
//! slices in tests) and implements [`Judge`](cordon_core::Judge) over it.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod judge;

pub use codec::{Handshake, Request, TokenReader};
pub use judge::LineJudge;
