//! The sink process's main event loop: INIT → READY → DRAINING → DEAD.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use measureflow_protocol::defaults::{
    DEFAULT_SUICIDE_TIMEOUT, WRITER_LOOP_POLL_TIMEOUT, WRITER_THREAD_WRAP_UP_TIMEOUT,
};
use measureflow_protocol::{recv_chunk, send_liveness_reply, LivenessRequest, PortPair};
use tracing::{debug, error, info, warn};

use crate::liveness_clock::LivenessClock;
use crate::sink_queue::{SinkMessage, SinkQueue};
use crate::writer_thread::WriterThread;

pub struct WriterLoopConfig {
    pub ports: PortPair,
    pub format_name: String,
    pub data_dir: PathBuf,
}

/// Runs the full INIT→READY→DRAINING→DEAD lifecycle and returns the
/// process exit code: 0 on clean self-termination, non-zero on bind
/// failure or a wrap-up timeout.
pub fn run(config: WriterLoopConfig) -> i32 {
    match run_inner(config) {
        Ok(()) => 0,
        Err(err) => {
            error!("writer loop exiting with an error: {err:#}");
            1
        }
    }
}

fn run_inner(config: WriterLoopConfig) -> Result<()> {
    let ctx = zmq::Context::new();

    // INIT.
    let reply_socket = ctx.socket(zmq::REP).context("failed to create reply socket")?;
    reply_socket
        .bind(&format!("tcp://127.0.0.1:{}", config.ports.req_port))
        .with_context(|| format!("failed to bind reply socket on port {}", config.ports.req_port))?;
    let pull_socket = ctx.socket(zmq::PULL).context("failed to create pull socket")?;
    pull_socket
        .connect(&format!("tcp://127.0.0.1:{}", config.ports.push_port))
        .with_context(|| format!("failed to connect pull socket to port {}", config.ports.push_port))?;

    let clock = Arc::new(LivenessClock::new());
    let (queue, queue_rx) = SinkQueue::new();
    let writer_thread = WriterThread::spawn(
        queue_rx,
        Arc::clone(&clock),
        config.data_dir.clone(),
        config.format_name.clone(),
    );
    clock.touch();

    let mut idle_timeout = DEFAULT_SUICIDE_TIMEOUT + Duration::from_secs(1);
    info!(
        push_port = config.ports.push_port,
        req_port = config.ports.req_port,
        format = %config.format_name,
        idle_timeout_secs = idle_timeout.as_secs_f64(),
        "writer loop ready"
    );

    // READY.
    loop {
        let mut items = [
            reply_socket.as_poll_item(zmq::POLLIN),
            pull_socket.as_poll_item(zmq::POLLIN),
        ];
        if let Err(err) = zmq::poll(&mut items, WRITER_LOOP_POLL_TIMEOUT.as_millis() as i64) {
            warn!("poll error: {err}");
        }

        if items[0].is_readable() {
            handle_liveness_request(&reply_socket, &clock, &mut idle_timeout);
        }

        if items[1].is_readable() {
            handle_data_frame(&pull_socket, &queue, &clock);
        }

        if clock.elapsed() > idle_timeout {
            break;
        }
    }

    // DRAINING.
    info!("idle timeout exceeded; draining");
    queue.enqueue_sentinel();
    if writer_thread.join_with_timeout(WRITER_THREAD_WRAP_UP_TIMEOUT) {
        info!("disk thread drained cleanly");
        Ok(())
    } else {
        anyhow::bail!(
            "disk thread failed to drain within {:?}",
            WRITER_THREAD_WRAP_UP_TIMEOUT
        );
    }
    // DEAD: sockets close as `ctx`/`reply_socket`/`pull_socket` drop here.
}

/// Receives one request, reconfigures the idle timeout, and always sends
/// a reply — even for a malformed payload — to keep the REP socket's
/// lockstep protocol intact.
fn handle_liveness_request(reply_socket: &zmq::Socket, clock: &LivenessClock, idle_timeout: &mut Duration) {
    let bytes = match reply_socket.recv_bytes(0) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("failed to receive on reply socket: {err}");
            return;
        }
    };

    match serde_json::from_slice::<LivenessRequest>(&bytes) {
        Ok(request) => {
            *idle_timeout = Duration::from_secs_f64(request.timeout_seconds) + Duration::from_secs(1);
            debug!(new_idle_timeout_secs = idle_timeout.as_secs_f64(), "liveness request processed");
        }
        Err(err) => {
            warn!("malformed liveness request JSON, idle timeout unchanged: {err}");
        }
    }

    if let Err(err) = send_liveness_reply(reply_socket) {
        warn!("failed to send liveness reply: {err}");
    }
    clock.touch();
}

fn handle_data_frame(pull_socket: &zmq::Socket, queue: &SinkQueue, clock: &LivenessClock) {
    match recv_chunk(pull_socket) {
        Ok((header, row)) => {
            queue.enqueue(SinkMessage { header, row });
            clock.touch();
        }
        Err(err) => {
            warn!("dropping malformed data frame: {err}");
        }
    }
}
