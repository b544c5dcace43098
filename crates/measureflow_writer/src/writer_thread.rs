//! The disk thread: drains [`SinkQueue`], owns a single [`FileFormatWriter`]
//! at a time, and opens a fresh output file on every run (guid) change.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use measureflow_sinks::FileFormatWriter;
use tracing::{info, warn};

use crate::liveness_clock::LivenessClock;
use crate::sink_queue::{SinkMessage, SinkQueueReceiver};

const QUEUE_POLL_TIMEOUT: Duration = Duration::from_millis(200);

/// `RunState`: whenever `current_guid` is `Some`, `writer` is open on
/// exactly one file derived from that guid.
struct RunState {
    current_guid: String,
    writer: FileFormatWriter,
}

/// A handle to the spawned disk thread. Joined with a bounded wrap-up
/// timeout from [`crate::writer_loop`]'s DRAINING state — not joined at
/// all if the caller drops the handle, matching the prototype's daemonic
/// thread outside of tests that need join semantics.
pub struct WriterThread {
    done_rx: Receiver<()>,
    handle: Option<JoinHandle<()>>,
}

impl WriterThread {
    pub fn spawn(
        queue_rx: SinkQueueReceiver,
        clock: Arc<LivenessClock>,
        data_dir: PathBuf,
        format_name: String,
    ) -> Self {
        let (done_tx, done_rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("measureflow-writer-thread".into())
            .spawn(move || {
                run(queue_rx, &clock, &data_dir, &format_name);
                let _ = done_tx.send(());
            })
            .expect("failed to spawn disk writer thread");
        Self {
            done_rx,
            handle: Some(handle),
        }
    }

    /// Waits up to `timeout` for the thread to finish (sentinel consumed
    /// or fatal error). Returns `true` if it finished in time.
    pub fn join_with_timeout(mut self, timeout: Duration) -> bool {
        match self.done_rx.recv_timeout(timeout) {
            Ok(()) => {
                if let Some(handle) = self.handle.take() {
                    let _ = handle.join();
                }
                true
            }
            Err(_) => false,
        }
    }
}

fn run(queue_rx: SinkQueueReceiver, clock: &LivenessClock, data_dir: &Path, format_name: &str) {
    let mut run_state: Option<RunState> = None;

    loop {
        let message = match queue_rx.recv_timeout(QUEUE_POLL_TIMEOUT) {
            Some(message) => message,
            None => continue,
        };

        if message.is_sentinel() {
            info!("termination sentinel received; disk thread exiting");
            break;
        }

        if let Err(err) = process_message(&mut run_state, data_dir, format_name, &message) {
            warn!("dropping message for run {}: {err:#}", message.header.guid);
        }
        clock.touch();
    }
    // `run_state` drops here, releasing the open file handle on every
    // exit path (sentinel or the loop never running at all).
}

fn process_message(
    run_state: &mut Option<RunState>,
    data_dir: &Path,
    format_name: &str,
    message: &SinkMessage,
) -> anyhow::Result<()> {
    let guid = &message.header.guid;
    let needs_new_file = match run_state {
        Some(state) => state.current_guid != *guid,
        None => true,
    };

    if needs_new_file {
        let mut writer = FileFormatWriter::for_format(format_name)?;
        let path = data_dir.join(guid);
        writer.start_new_file(&path)?;
        writer.set_column_names(message.row.column_names());
        info!(guid = %guid, path = %path.display(), "opened output file for new run");
        *run_state = Some(RunState {
            current_guid: guid.clone(),
            writer,
        });
    }

    let state = run_state.as_mut().expect("run_state just populated above");
    if message.header.chunkid == 1 {
        state.writer.write_header()?;
    }
    state.writer.write_row(&message.row)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink_queue::SinkQueue;
    use measureflow_protocol::{ChunkHeader, Row, RowValue};
    use std::fs;

    #[test]
    fn writes_one_file_per_guid_and_closes_on_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let (queue, rx) = SinkQueue::new();
        let clock = Arc::new(LivenessClock::new());
        let thread = WriterThread::spawn(rx, Arc::clone(&clock), dir.path().to_path_buf(), "GNUPLOT".into());

        queue.enqueue(SinkMessage {
            header: ChunkHeader::new("run-a", 1),
            row: Row::new(vec![("param".into(), RowValue::Int(0))]),
        });
        queue.enqueue(SinkMessage {
            header: ChunkHeader::new("run-a", 2),
            row: Row::new(vec![("param".into(), RowValue::Int(1))]),
        });
        queue.enqueue_sentinel();

        assert!(thread.join_with_timeout(Duration::from_secs(5)));

        let contents = fs::read_to_string(dir.path().join("run-a.dat")).unwrap();
        assert_eq!(contents, "param\n0\n1\n");
    }

    #[test]
    fn guid_change_closes_the_previous_file_and_opens_a_new_one() {
        let dir = tempfile::tempdir().unwrap();
        let (queue, rx) = SinkQueue::new();
        let clock = Arc::new(LivenessClock::new());
        let thread = WriterThread::spawn(rx, Arc::clone(&clock), dir.path().to_path_buf(), "GNUPLOT".into());

        queue.enqueue(SinkMessage {
            header: ChunkHeader::new("run-a", 1),
            row: Row::new(vec![("param".into(), RowValue::Int(0))]),
        });
        queue.enqueue(SinkMessage {
            header: ChunkHeader::new("run-b", 1),
            row: Row::new(vec![("param".into(), RowValue::Int(9))]),
        });
        queue.enqueue_sentinel();

        assert!(thread.join_with_timeout(Duration::from_secs(5)));

        assert_eq!(
            fs::read_to_string(dir.path().join("run-a.dat")).unwrap(),
            "param\n0\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("run-b.dat")).unwrap(),
            "param\n9\n"
        );
    }

    #[test]
    fn join_with_timeout_reports_false_when_no_sentinel_arrives() {
        let dir = tempfile::tempdir().unwrap();
        let (_queue, rx) = SinkQueue::new();
        let clock = Arc::new(LivenessClock::new());
        let thread = WriterThread::spawn(rx, clock, dir.path().to_path_buf(), "GNUPLOT".into());
        assert!(!thread.join_with_timeout(Duration::from_millis(50)));
    }
}
