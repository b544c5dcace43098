//! The Measurer producer runtime: port acquisition, on-demand sink spawn,
//! liveness negotiation, and chunk framing.
//!
//! This crate has no global subscriber of its own — it emits `tracing`
//! events and leaves initialization to the embedding application, or to
//! `measureflow_logging::init_writer_logging` for standalone test
//! binaries.

mod error;
mod measurer_client;
mod port_allocator;
mod spawn_supervisor;

pub use error::{MeasurerError, MeasurerResult};
pub use measurer_client::MeasurerClient;
pub use port_allocator::{AcquiredPorts, PortAllocator};
pub use spawn_supervisor::{resolve_writer_executable, ChildHandle, SpawnSupervisor, WRITER_EXE_ENV_VAR};
