//! Drives [`writer_loop::run`] directly over real loopback sockets, the
//! same way `casparian_sentinel/tests/integration.rs` exercises its
//! ZMQ-based control plane: bind/connect real sockets, run the component
//! under test on another thread, assert on observable output.

use std::time::{Duration, Instant};

use measureflow_protocol::{recv_liveness_reply, send_chunk, send_liveness_request};
use measureflow_protocol::{ChunkHeader, PortPair, Row, RowValue};
use measureflow_writer::writer_loop::{self, WriterLoopConfig};

fn spawn_writer_loop(ports: PortPair, data_dir: std::path::PathBuf) -> std::thread::JoinHandle<i32> {
    std::thread::spawn(move || {
        writer_loop::run(WriterLoopConfig {
            ports,
            format_name: "GNUPLOT".to_string(),
            data_dir,
        })
    })
}

fn connected_push_and_req(ports: PortPair) -> (zmq::Context, zmq::Socket, zmq::Socket) {
    let ctx = zmq::Context::new();
    let push = ctx.socket(zmq::PUSH).unwrap();
    push.connect(&format!("tcp://127.0.0.1:{}", ports.push_port)).unwrap();
    let req = ctx.socket(zmq::REQ).unwrap();
    req.connect(&format!("tcp://127.0.0.1:{}", ports.req_port)).unwrap();
    (ctx, push, req)
}

#[test]
fn full_run_of_rows_produces_the_expected_tabular_file() {
    let dir = tempfile::tempdir().unwrap();
    let ports = PortPair::new(19_000);
    let handle = spawn_writer_loop(ports, dir.path().to_path_buf());
    std::thread::sleep(Duration::from_millis(200));

    let (_ctx, push, req) = connected_push_and_req(ports);
    send_liveness_request(&req, 1.0).unwrap();
    recv_liveness_reply(&req).unwrap();

    for (chunkid, value) in [0, 1, 5, 6, 8].into_iter().enumerate() {
        let header = ChunkHeader::new("run-x", chunkid as i64 + 1);
        let row = Row::new(vec![("param".into(), RowValue::Int(value))]);
        send_chunk(&push, &header, &row).unwrap();
    }

    let exit_code = handle.join().unwrap();
    assert_eq!(exit_code, 0);

    let contents = std::fs::read_to_string(dir.path().join("run-x.dat")).unwrap();
    assert_eq!(contents, "param\n0\n1\n5\n6\n8\n");
}

#[test]
fn idle_timeout_self_terminates_within_one_poll_interval_of_the_deadline() {
    let dir = tempfile::tempdir().unwrap();
    let ports = PortPair::new(19_010);
    let handle = spawn_writer_loop(ports, dir.path().to_path_buf());
    std::thread::sleep(Duration::from_millis(200));

    let (_ctx, _push, req) = connected_push_and_req(ports);
    // Reconfigure to a 1s idle timeout (1s + 1s grace per spec.md §4.6).
    send_liveness_request(&req, 1.0).unwrap();
    recv_liveness_reply(&req).unwrap();

    let start = Instant::now();
    let exit_code = handle.join().unwrap();
    let elapsed = start.elapsed();

    assert_eq!(exit_code, 0);
    // idle_timeout = 1 + 1 = 2s; allow slack for poll granularity and
    // scheduling jitter on a loaded test machine.
    assert!(elapsed < Duration::from_millis(3_000), "elapsed={elapsed:?}");
}

#[test]
fn a_second_liveness_request_after_the_first_keeps_the_sink_alive_longer() {
    let dir = tempfile::tempdir().unwrap();
    let ports = PortPair::new(19_020);
    let handle = spawn_writer_loop(ports, dir.path().to_path_buf());
    std::thread::sleep(Duration::from_millis(200));

    let (_ctx, _push, req) = connected_push_and_req(ports);
    send_liveness_request(&req, 1.0).unwrap();
    recv_liveness_reply(&req).unwrap();

    std::thread::sleep(Duration::from_millis(500));
    send_liveness_request(&req, 1.0).unwrap();
    recv_liveness_reply(&req).unwrap();

    let start = Instant::now();
    let exit_code = handle.join().unwrap();
    let elapsed = start.elapsed();

    assert_eq!(exit_code, 0);
    // The second request pushed the deadline out by another ~2s from the
    // 500ms mark, so total runtime should be well past the first
    // request's own 2s deadline.
    assert!(elapsed >= Duration::from_millis(1_800), "elapsed={elapsed:?}");
}
