//! Producer-side error type.

use measureflow_protocol::ProtocolError;
use thiserror::Error;

pub type MeasurerResult<T> = std::result::Result<T, MeasurerError>;

#[derive(Debug, Error)]
pub enum MeasurerError {
    #[error("no usable adjacent port pair found starting at {seed} after {attempts} attempts")]
    PortsUnavailable { seed: u16, attempts: u16 },

    #[error("sink did not answer a liveness probe: {reason}")]
    SpawnFailed { reason: String },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
