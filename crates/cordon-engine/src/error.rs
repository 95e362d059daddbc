//! Run-level errors.

use std::error::Error;
use std::fmt;

use cordon_core::{ConfigError, DivergenceError, ProtocolError};
use cordon_space::SpaceError;

/// Anything that ends a run early.
#[derive(Debug)]
pub enum RunError {
    /// The handshake produced unusable parameters.
    Config(ConfigError),
    /// The grid could not be laid out.
    Space(SpaceError),
    /// Talking to the judge failed.
    Protocol(ProtocolError),
    /// An observation contradicted the belief.
    Divergence(DivergenceError),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Space(e) => write!(f, "space: {e}"),
            Self::Protocol(e) => write!(f, "protocol: {e}"),
            Self::Divergence(e) => write!(f, "model: {e}"),
        }
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Space(e) => Some(e),
            Self::Protocol(e) => Some(e),
            Self::Divergence(e) => Some(e),
        }
    }
}

impl From<ConfigError> for RunError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<SpaceError> for RunError {
    fn from(e: SpaceError) -> Self {
        Self::Space(e)
    }
}

impl From<ProtocolError> for RunError {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

impl From<DivergenceError> for RunError {
    fn from(e: DivergenceError) -> Self {
        Self::Divergence(e)
    }
}
