//! Launches the Writer sink as a detached child process.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use measureflow_protocol::PortPair;
use tracing::info;

/// Environment variable that, when set, overrides the writer executable
/// path used by [`SpawnSupervisor::spawn`]. Falls back to a binary named
/// `measureflow-writer` next to the current executable, matching this
/// codebase's "env var with a hardcoded fallback" shape for locating
/// sibling tooling.
pub const WRITER_EXE_ENV_VAR: &str = "MEASUREFLOW_WRITER_EXE";

/// A handle to a spawned sink process, exposed for diagnostics and tests.
pub struct ChildHandle {
    child: Child,
}

impl ChildHandle {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Polls for exit up to `timeout`, sleeping briefly between checks.
    pub fn wait(&mut self, timeout: Duration) -> Option<std::process::ExitStatus> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => return Some(status),
                Ok(None) => {
                    if Instant::now() >= deadline {
                        return None;
                    }
                    std::thread::sleep(Duration::from_millis(20));
                }
                Err(_) => return None,
            }
        }
    }

    pub fn kill(&mut self) -> std::io::Result<()> {
        self.child.kill()
    }
}

/// Resolves the writer executable path: the `MEASUREFLOW_WRITER_EXE`
/// environment variable if set, else a `measureflow-writer` binary next to
/// the current executable.
pub fn resolve_writer_executable() -> PathBuf {
    if let Ok(path) = std::env::var(WRITER_EXE_ENV_VAR) {
        return PathBuf::from(path);
    }
    let exe_name = if cfg!(windows) {
        "measureflow-writer.exe"
    } else {
        "measureflow-writer"
    };
    std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(|dir| dir.join(exe_name)))
        .unwrap_or_else(|| PathBuf::from(exe_name))
}

pub struct SpawnSupervisor;

impl SpawnSupervisor {
    /// Launches `exe` as a detached child, passing `push_port`, `req_port`
    /// and `format_name` as positional arguments. Does not itself confirm
    /// sink readiness — that is the caller's follow-up liveness probe.
    pub fn spawn(exe: &Path, ports: PortPair, format_name: &str) -> Result<ChildHandle> {
        info!(
            push_port = ports.push_port,
            req_port = ports.req_port,
            format = format_name,
            exe = %exe.display(),
            "spawning sink process"
        );
        let child = Command::new(exe)
            .arg(ports.push_port.to_string())
            .arg(ports.req_port.to_string())
            .arg(format_name)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to spawn sink executable {}", exe.display()))?;
        Ok(ChildHandle { child })
    }
}
