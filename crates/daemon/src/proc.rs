// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OS process operations behind a capability trait so the supervisor can be
//! tested without spawning anything.
//!
//! Backends are spawned detached: their own process group, stdio on
//! `/dev/null`, no controlling terminal inherited from the daemon. Signals
//! to already-gone pids count as success so stop paths stay idempotent.

use std::path::PathBuf;
use std::process::Stdio;

use nix::sys::signal::{kill as send_signal, Signal};
use nix::unistd::Pid;
use tracing::debug;

/// Fully resolved command line for one backend process. Construction lives
/// in the supervisor's backend builder; the runner only executes it.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub cwd: PathBuf,
}

/// Capability set over OS processes and ports.
pub trait ProcessRunner: Send + Sync {
    /// Spawn a detached process and return its pid.
    fn spawn(&self, command: &BackendCommand) -> std::io::Result<u32>;

    /// Best-effort signal; a missing process is success.
    fn kill(&self, pid: u32, signal: Signal) -> std::io::Result<()>;

    /// Liveness probe (signal 0).
    fn is_process_running(&self, pid: u32) -> bool;

    /// Whether `127.0.0.1:port` can currently be bound. Ports that
    /// bind-then-release count as available.
    fn is_port_available(&self, port: u16) -> bool;

    /// Run a short helper command synchronously and capture its output
    /// (tmux teardown, dependency probes).
    fn run(&self, program: &str, args: &[&str]) -> std::io::Result<std::process::Output>;
}

/// Real implementation over the host OS.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn spawn(&self, command: &BackendCommand) -> std::io::Result<u32> {
        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args)
            .current_dir(&command.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        for (key, value) in &command.env {
            cmd.env(key, value);
        }
        // New process group so the backend survives the daemon and never
        // shares its controlling terminal.
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn()?;
        let pid = child.id().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "spawned process exited immediately")
        })?;

        // Reap in the background so exited backends don't linger as zombies
        // for the lifetime of the daemon.
        tokio::spawn(async move {
            let status = child.wait().await;
            debug!(pid, ?status, "backend process reaped");
        });

        Ok(pid)
    }

    fn kill(&self, pid: u32, signal: Signal) -> std::io::Result<()> {
        match send_signal(Pid::from_raw(pid as i32), signal) {
            Ok(()) => Ok(()),
            // Already gone: stop is idempotent.
            Err(nix::errno::Errno::ESRCH) => Ok(()),
            Err(e) => Err(std::io::Error::from_raw_os_error(e as i32)),
        }
    }

    fn is_process_running(&self, pid: u32) -> bool {
        send_signal(Pid::from_raw(pid as i32), None::<Signal>).is_ok()
    }

    fn is_port_available(&self, port: u16) -> bool {
        std::net::TcpListener::bind(("127.0.0.1", port)).is_ok()
    }

    fn run(&self, program: &str, args: &[&str]) -> std::io::Result<std::process::Output> {
        std::process::Command::new(program).args(args).output()
    }
}


#[cfg(test)]
#[path = "proc_tests.rs"]
mod tests;
