//! Multipart message framing for the data channel and the request channel.

use crate::error::{ProtocolError, Result};
use crate::types::{ChunkHeader, LivenessRequest, Row};
use zmq::Socket;

/// Sends one data-channel chunk: header frame (JSON) then row frame
/// (pickle). Rejects the termination sentinel — it is in-process only.
pub fn send_chunk(socket: &Socket, header: &ChunkHeader, row: &Row) -> Result<()> {
    if header.is_sentinel() {
        return Err(ProtocolError::SentinelOnWire);
    }
    let header_bytes = serde_json::to_vec(header)?;
    let row_bytes = serde_pickle::to_vec(row, serde_pickle::SerOptions::new())?;
    socket.send(&header_bytes, zmq::SNDMORE)?;
    socket.send(&row_bytes, 0)?;
    Ok(())
}

/// Receives one data-channel chunk.
pub fn recv_chunk(socket: &Socket) -> Result<(ChunkHeader, Row)> {
    let frames = socket.recv_multipart(0)?;
    if frames.len() != 2 {
        return Err(ProtocolError::InvalidFrameCount {
            expected: 2,
            got: frames.len(),
        });
    }
    let header: ChunkHeader = serde_json::from_slice(&frames[0])?;
    let row: Row = serde_pickle::from_slice(&frames[1], serde_pickle::DeOptions::new())?;
    Ok((header, row))
}

/// Sends a liveness/reconfiguration request on the producer's REQ socket.
pub fn send_liveness_request(socket: &Socket, timeout_seconds: f64) -> Result<()> {
    let request = LivenessRequest { timeout_seconds };
    let bytes = serde_json::to_vec(&request)?;
    socket.send(&bytes, 0)?;
    Ok(())
}

/// Receives a liveness/reconfiguration request on the sink's REP socket.
pub fn recv_liveness_request(socket: &Socket) -> Result<LivenessRequest> {
    let bytes = socket.recv_bytes(0)?;
    let request: LivenessRequest = serde_json::from_slice(&bytes)?;
    Ok(request)
}

/// Sends the single-byte, content-irrelevant liveness reply.
pub fn send_liveness_reply(socket: &Socket) -> Result<()> {
    socket.send(crate::defaults::LIVENESS_REPLY, 0)?;
    Ok(())
}

/// Receives the liveness reply. Its contents are deliberately ignored.
pub fn recv_liveness_reply(socket: &Socket) -> Result<()> {
    socket.recv_bytes(0)?;
    Ok(())
}
