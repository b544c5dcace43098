//! Protocol error types.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProtocolError>;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("malformed header JSON: {0}")]
    MalformedHeader(#[from] serde_json::Error),

    #[error("malformed row payload: {0}")]
    MalformedRow(#[from] serde_pickle::Error),

    #[error("invalid frame count: expected {expected}, got {got}")]
    InvalidFrameCount { expected: usize, got: usize },

    #[error("sentinel chunkid (-1) is not permitted on the wire")]
    SentinelOnWire,

    #[error("zmq error: {0}")]
    Zmq(#[from] zmq::Error),
}
