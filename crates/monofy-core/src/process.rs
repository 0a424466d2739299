//! Child process handles.
//!
//! Children inherit stdin, stdout and stderr from the supervisor; nothing is
//! captured. A handle remembers its exit status once observed and never
//! signals a reaped pid again, since the kernel may have recycled it.

use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::command::CommandSpec;
use crate::error::{Error, Result};

/// Exit code convention for a finished process: its own code, or
/// `128 + signal` when it was killed by a signal.
pub fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(1)
}

fn build_command(spec: &CommandSpec) -> Result<Command> {
    let program = spec.program().ok_or_else(|| Error::SpawnFailed {
        command: spec.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
    })?;
    let mut cmd = Command::new(program);
    cmd.args(spec.args())
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    Ok(cmd)
}

/// Run `spec` to completion and return its exit status.
pub async fn run_to_completion(spec: &CommandSpec) -> Result<ExitStatus> {
    let mut cmd = build_command(spec)?;
    cmd.status().await.map_err(|source| Error::SpawnFailed {
        command: spec.to_string(),
        source,
    })
}

/// Live handle to one spawned member of the parallel group.
#[derive(Debug)]
pub struct ChildHandle {
    index: usize,
    pid: Pid,
    command: CommandSpec,
    child: Child,
    status: Option<ExitStatus>,
}

impl ChildHandle {
    /// Spawn `spec` as parallel-group member number `index`.
    pub fn spawn(index: usize, spec: &CommandSpec) -> Result<Self> {
        let mut cmd = build_command(spec)?;
        let child = cmd.spawn().map_err(|source| Error::SpawnFailed {
            command: spec.to_string(),
            source,
        })?;
        // A freshly spawned, not yet awaited child always has a pid.
        let raw_pid = child.id().ok_or_else(|| Error::SpawnFailed {
            command: spec.to_string(),
            source: std::io::Error::other("spawned child has no pid"),
        })?;
        #[allow(clippy::cast_possible_wrap)]
        let pid = Pid::from_raw(raw_pid as i32);
        debug!(index, %pid, command = %spec, "Spawned child");
        Ok(Self {
            index,
            pid,
            command: spec.clone(),
            child,
            status: None,
        })
    }

    pub const fn index(&self) -> usize {
        self.index
    }

    #[allow(clippy::cast_sign_loss)]
    pub fn pid(&self) -> u32 {
        self.pid.as_raw() as u32
    }

    pub const fn command(&self) -> &CommandSpec {
        &self.command
    }

    /// Exit status, once the child has been reaped.
    pub const fn exit_status(&self) -> Option<ExitStatus> {
        self.status
    }

    pub const fn is_reaped(&self) -> bool {
        self.status.is_some()
    }

    /// Best-effort signal delivery.
    ///
    /// Returns `true` when the signal was handed to the kernel. Reaped handles
    /// and vanished processes are skipped silently.
    pub fn signal(&self, sig: Signal) -> bool {
        if self.is_reaped() {
            debug!(pid = %self.pid, signal = %sig, "Child already reaped, not signalling");
            return false;
        }
        match signal::kill(self.pid, sig) {
            Ok(()) => {
                debug!(pid = %self.pid, signal = %sig, "Signalled child");
                true
            }
            Err(Errno::ESRCH) => {
                debug!(pid = %self.pid, signal = %sig, "Child already gone");
                false
            }
            Err(e) => {
                warn!(pid = %self.pid, signal = %sig, error = %e, "Failed to signal child");
                false
            }
        }
    }

    /// Non-blocking exit check. Once `Some`, stays `Some`.
    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>> {
        if self.status.is_none() {
            self.status = self.child.try_wait().map_err(|source| Error::Wait {
                pid: self.pid(),
                source,
            })?;
        }
        Ok(self.status)
    }
}
