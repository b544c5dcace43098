//! Wire protocol shared by the measurer producer and the writer sink.
//!
//! Two channels, both over loopback TCP: a push/pull data channel carrying
//! chunk frames, and a req/rep request channel carrying liveness probes
//! that double as idle-timeout reconfiguration.

pub mod defaults;
mod error;
mod framing;
mod types;

pub use error::{ProtocolError, Result};
pub use framing::{
    recv_chunk, recv_liveness_reply, recv_liveness_request, send_chunk, send_liveness_reply,
    send_liveness_request,
};
pub use types::{ChunkHeader, LivenessRequest, PortPair, Row, RowValue};
