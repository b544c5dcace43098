//! Shared configuration constants for the producer and the sink.
//!
//! These are compiled-in defaults, not environment- or file-driven: this is
//! a two-process prototype, not a server with an operator-facing config
//! surface.

use std::time::Duration;

/// Idle timeout both sides start with before any liveness request has been
/// exchanged.
pub const DEFAULT_SUICIDE_TIMEOUT: Duration = Duration::from_secs(15);

/// Simulated slow-disk delay applied after every row write. A production
/// build would default this to zero and expose it only as a stress knob;
/// kept nonzero here because the backpressure property depends on it.
pub const WRITE_ROW_ARTIFICIAL_SLEEP: Duration = Duration::from_secs(1);

/// How long the producer waits for the first liveness probe after spawning
/// a fresh sink.
pub const WRITER_SPAWN_SLEEP_TIME: Duration = Duration::from_secs(5);

/// Steady-state liveness probe poll timeout.
pub const PROBE_POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// WriterThread join timeout once the sink has decided to drain.
pub const WRITER_THREAD_WRAP_UP_TIMEOUT: Duration = Duration::from_secs(10);

/// Poll timeout for the sink's network loop.
pub const WRITER_LOOP_POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Default number of consecutive ports PortAllocator will try.
pub const DEFAULT_PORT_SCAN_ATTEMPTS: u16 = 10;

/// Environment variable overriding the output directory; falls back to
/// `DEFAULT_DATA_DIR` when unset.
pub const DATA_DIR_ENV_VAR: &str = "MEASUREFLOW_DATA_DIR";
pub const DEFAULT_DATA_DIR: &str = "./data";

pub const GNUPLOT_FORMAT: &str = "GNUPLOT";
pub const PICKLE_FORMAT: &str = "PICKLE";
pub const DEFAULT_FORMAT: &str = GNUPLOT_FORMAT;

pub const GNUPLOT_EXTENSION: &str = ".dat";
pub const PICKLE_EXTENSION: &str = ".pkl";

/// guid placeholder before the first `startRun()`.
pub const ZERO_GUID: &str = "00000000-0000-0000-0000-000000000000";

/// Single-byte, content-irrelevant liveness reply.
pub const LIVENESS_REPLY: &[u8] = b" ";
