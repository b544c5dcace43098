//! Measureflow Writer (sink process)
//!
//! Usage:
//!     measureflow-writer <push_port> <req_port> <format_name>

use std::path::PathBuf;

use clap::Parser;
use measureflow_protocol::defaults::{DATA_DIR_ENV_VAR, DEFAULT_DATA_DIR};
use measureflow_protocol::PortPair;
use measureflow_sinks::is_known_format;
use measureflow_writer::writer_loop::{self, WriterLoopConfig};

#[derive(Parser, Debug)]
#[command(name = "measureflow-writer", about = "Measureflow sink process")]
struct Args {
    /// Port the producer pushes data chunks to; this process connects to it.
    push_port: u16,

    /// Port this process binds to answer liveness/reconfiguration requests.
    req_port: u16,

    /// Key into the Formats registry ("GNUPLOT" or "PICKLE").
    format_name: String,
}

fn main() {
    if let Err(err) = measureflow_logging::init_writer_logging("measureflow-writer") {
        eprintln!("failed to initialize logging: {err:#}");
    }

    let args = Args::parse();

    if !is_known_format(&args.format_name) {
        tracing::error!(format = %args.format_name, "unknown format name");
        std::process::exit(1);
    }

    let data_dir = resolve_data_dir();
    if let Err(err) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(dir = %data_dir.display(), "failed to create data directory: {err}");
        std::process::exit(1);
    }

    let exit_code = writer_loop::run(WriterLoopConfig {
        ports: PortPair {
            push_port: args.push_port,
            req_port: args.req_port,
        },
        format_name: args.format_name,
        data_dir,
    });

    std::process::exit(exit_code);
}

fn resolve_data_dir() -> PathBuf {
    std::env::var(DATA_DIR_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR))
}
