//! The producer-side runtime: port acquisition, on-demand sink spawn,
//! liveness negotiation, and chunk framing.

use std::time::Instant;

use measureflow_protocol::defaults::{
    DEFAULT_FORMAT, DEFAULT_PORT_SCAN_ATTEMPTS, DEFAULT_SUICIDE_TIMEOUT, PROBE_POLL_TIMEOUT,
    WRITER_SPAWN_SLEEP_TIME, ZERO_GUID,
};
use measureflow_protocol::{recv_liveness_reply, send_chunk, send_liveness_request};
use measureflow_protocol::{ChunkHeader, PortPair, Row};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{MeasurerError, MeasurerResult};
use crate::port_allocator::PortAllocator;
use crate::spawn_supervisor::{resolve_writer_executable, ChildHandle, SpawnSupervisor};
use std::path::PathBuf;
use std::time::Duration;

type GuidFactory = Box<dyn FnMut() -> String + Send>;

fn default_guid_factory() -> GuidFactory {
    Box::new(|| Uuid::new_v4().to_string())
}

/// The producer-side runtime. Created once per logical measurement
/// session; may execute many runs and spawn zero or more sink
/// subprocesses over its lifetime.
pub struct MeasurerClient {
    ctx: zmq::Context,
    push_socket: zmq::Socket,
    req_socket: zmq::Socket,
    ports: PortPair,
    suicide_timeout: Duration,
    format_name: String,
    writer_executable: PathBuf,
    guid: String,
    chunk_id: i64,
    last_send_time: Instant,
    guid_factory: GuidFactory,
    child: Option<ChildHandle>,
}

impl MeasurerClient {
    pub fn new(
        start_port: u16,
        suicide_timeout: Option<Duration>,
        file_format: Option<&str>,
    ) -> MeasurerResult<Self> {
        Self::with_guid_factory(
            start_port,
            suicide_timeout,
            file_format,
            default_guid_factory(),
        )
    }

    /// Identical to [`Self::new`] but with a pluggable guid generator, for
    /// tests that need deterministic run identifiers.
    pub fn with_guid_factory(
        start_port: u16,
        suicide_timeout: Option<Duration>,
        file_format: Option<&str>,
        guid_factory: GuidFactory,
    ) -> MeasurerResult<Self> {
        let ctx = zmq::Context::new();
        let acquired = PortAllocator::acquire(&ctx, start_port, DEFAULT_PORT_SCAN_ATTEMPTS)?;
        let suicide_timeout = suicide_timeout.unwrap_or(DEFAULT_SUICIDE_TIMEOUT);

        Ok(Self {
            ctx,
            push_socket: acquired.push_socket,
            req_socket: acquired.req_socket,
            ports: acquired.ports,
            suicide_timeout,
            format_name: file_format.unwrap_or(DEFAULT_FORMAT).to_string(),
            writer_executable: resolve_writer_executable(),
            guid: ZERO_GUID.to_string(),
            chunk_id: 0,
            // Backdated so the first `add_result` always treats the sink as
            // plausibly dead and probes/spawns. Saturates instead of
            // panicking when the monotonic clock's origin is within
            // `suicide_timeout + 1s` of process start.
            last_send_time: Instant::now()
                .checked_sub(suicide_timeout + Duration::from_secs(1))
                .unwrap_or_else(Instant::now),
            guid_factory,
            child: None,
        })
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    pub fn ports(&self) -> PortPair {
        self.ports
    }

    /// The currently spawned sink's child handle, for tests that need to
    /// observe or wait on its exit directly.
    pub fn spawned_child_mut(&mut self) -> Option<&mut ChildHandle> {
        self.child.as_mut()
    }

    /// Allocates a fresh guid and resets the per-run chunk counter.
    pub fn start_run(&mut self) {
        self.guid = (self.guid_factory)();
        self.chunk_id = 0;
        info!(guid = %self.guid, "starting new run");
    }

    /// Sends `row` under the current run. Spawns (or re-spawns) the sink
    /// on demand if the last send happened long enough ago that the sink
    /// may plausibly have self-terminated.
    pub fn add_result(&mut self, row: Row) -> MeasurerResult<()> {
        let now = Instant::now();
        if now.duration_since(self.last_send_time) > self.suicide_timeout {
            self.ensure_live_sink()?;
        }

        self.chunk_id += 1;
        let header = ChunkHeader::new(self.guid.clone(), self.chunk_id);
        send_chunk(&self.push_socket, &header, &row)?;
        self.last_send_time = Instant::now();
        Ok(())
    }

    /// Probes the sink; if it doesn't answer, spawns a fresh one and
    /// probes again within the spawn-settle budget.
    fn ensure_live_sink(&mut self) -> MeasurerResult<()> {
        if self.probe_liveness(PROBE_POLL_TIMEOUT) {
            return Ok(());
        }

        debug!("liveness probe failed; spawning a fresh sink");
        let spawn_result =
            SpawnSupervisor::spawn(&self.writer_executable, self.ports, &self.format_name);
        self.rebuild_req_socket()?;

        let child = spawn_result.map_err(|err| MeasurerError::SpawnFailed {
            reason: err.to_string(),
        })?;
        self.child = Some(child);

        if self.probe_liveness(WRITER_SPAWN_SLEEP_TIME) {
            return Ok(());
        }

        self.rebuild_req_socket()?;
        Err(MeasurerError::SpawnFailed {
            reason: "sink did not answer a liveness probe after spawn".to_string(),
        })
    }

    /// Sends one liveness/reconfiguration request and polls for the reply
    /// within `poll_timeout`. Returns `false` on any send, poll, or recv
    /// failure — the caller is responsible for discarding the socket
    /// afterwards per the req/rep lockstep rule.
    fn probe_liveness(&self, poll_timeout: Duration) -> bool {
        if send_liveness_request(&self.req_socket, self.suicide_timeout.as_secs_f64()).is_err() {
            return false;
        }

        let mut items = [self.req_socket.as_poll_item(zmq::POLLIN)];
        let poll_result = zmq::poll(&mut items, poll_timeout.as_millis() as i64);
        match poll_result {
            Ok(n) if n > 0 && items[0].is_readable() => {
                recv_liveness_reply(&self.req_socket).is_ok()
            }
            _ => false,
        }
    }

    /// Discards the current request socket and connects a fresh one to
    /// the same `req_port`. The req/rep pattern is strictly lockstep: a
    /// request with no reply leaves the socket unable to send again.
    fn rebuild_req_socket(&mut self) -> MeasurerResult<()> {
        if let Err(err) = self.req_socket.set_linger(0) {
            warn!("failed to set linger on stale request socket: {err}");
        }
        let fresh = self.ctx.socket(zmq::REQ).map_err(|err| {
            MeasurerError::Protocol(measureflow_protocol::ProtocolError::from(err))
        })?;
        fresh
            .connect(&format!("tcp://127.0.0.1:{}", self.ports.req_port))
            .map_err(|err| {
                MeasurerError::Protocol(measureflow_protocol::ProtocolError::from(err))
            })?;
        self.req_socket = fresh;
        Ok(())
    }
}
