//! The judge interface.

use crate::cell::Observation;
use crate::error::ProtocolError;

/// The game the agent plays against.
///
/// Every method consumes game time except [`finish`](Judge::finish):
/// `add_med` and `observe` take one turn each, `wait_time` takes
/// `turns`. Implementations must report a non-zero judge status as
/// [`ProtocolError::Rejected`].
pub trait Judge {
    /// Place one dose on column `x`, row `y`.
    fn add_med(&mut self, x: u32, y: u32) -> Result<(), ProtocolError>;

    /// Reveal the true grid as it stands before this turn is played.
    fn observe(&mut self) -> Result<Observation, ProtocolError>;

    /// Let `turns` turns pass without acting.
    fn wait_time(&mut self, turns: u32) -> Result<(), ProtocolError>;

    /// Tell the judge the agent is done.
    fn finish(&mut self) -> Result<(), ProtocolError>;
}
