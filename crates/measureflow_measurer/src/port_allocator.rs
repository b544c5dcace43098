//! Bind/connect-with-fallback port acquisition, shared by anything that
//! needs a producer-side push/req port pair.

use measureflow_protocol::PortPair;
use tracing::{debug, warn};

use crate::error::{MeasurerError, MeasurerResult};

/// The sockets and port numbers acquired by [`PortAllocator::acquire`].
/// `push_socket` is already bound to `ports.push_port`; `req_socket` is
/// already connected to `ports.req_port`.
pub struct AcquiredPorts {
    pub push_socket: zmq::Socket,
    pub req_socket: zmq::Socket,
    pub ports: PortPair,
}

/// Scans a bounded range of adjacent port pairs starting at a caller-given
/// seed, binding the push port and connecting the request port.
///
/// Does not verify that `req_port` is actually free on the sink side — the
/// sink's own bind on that port is the authoritative check; a collision
/// there surfaces as a spawn failure instead.
pub struct PortAllocator;

impl PortAllocator {
    pub fn acquire(
        ctx: &zmq::Context,
        seed: u16,
        attempts: u16,
    ) -> MeasurerResult<AcquiredPorts> {
        for offset in 0..attempts {
            let push_port = seed.wrapping_add(offset);
            let req_port = push_port.wrapping_add(1);

            let push_socket = match ctx.socket(zmq::PUSH) {
                Ok(socket) => socket,
                Err(err) => {
                    warn!("failed to create PUSH socket for port {push_port}: {err}");
                    continue;
                }
            };
            // spec.md §4.2: the push socket's high-water mark bounds
            // producer-side buffering to one outgoing message, so a send
            // blocks (applying backpressure) instead of queuing unboundedly
            // when the sink is behind.
            if let Err(err) = push_socket.set_sndhwm(1) {
                warn!("failed to set SNDHWM on push socket for port {push_port}: {err}");
                continue;
            }
            if let Err(err) = push_socket.bind(&format!("tcp://127.0.0.1:{push_port}")) {
                debug!("port {push_port} unavailable: {err}");
                continue;
            }

            let req_socket = match ctx.socket(zmq::REQ) {
                Ok(socket) => socket,
                Err(err) => {
                    warn!("failed to create REQ socket for port {req_port}: {err}");
                    continue;
                }
            };
            if let Err(err) = req_socket.connect(&format!("tcp://127.0.0.1:{req_port}")) {
                warn!("failed to connect request socket to port {req_port}: {err}");
                continue;
            }

            debug!("acquired port pair push={push_port} req={req_port}");
            return Ok(AcquiredPorts {
                push_socket,
                req_socket,
                ports: PortPair { push_port, req_port },
            });
        }

        Err(MeasurerError::PortsUnavailable { seed, attempts })
    }
}
