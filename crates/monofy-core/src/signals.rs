//! Termination signal registration.
//!
//! SIGINT and SIGTERM are caught through tokio's signal driver, so the
//! "handler" is an ordinary future polled by the coordinator's control loop
//! rather than code running in async-signal context. Once registered the
//! handlers stay installed for the rest of the process lifetime.

use nix::sys::signal::Signal;
use tokio::signal::unix::{SignalKind, signal};

use crate::error::{Error, Result};

/// Signals forwarded verbatim to every tracked child.
pub const FORWARDED_SIGNALS: [Signal; 2] = [Signal::SIGINT, Signal::SIGTERM];

/// Receiver for the two conventional termination signals.
#[derive(Debug)]
pub struct TerminationSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

impl TerminationSignals {
    /// Install handlers for SIGINT and SIGTERM.
    ///
    /// Must be called from within a tokio runtime.
    pub fn register() -> Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt()).map_err(Error::SignalSetup)?,
            terminate: signal(SignalKind::terminate()).map_err(Error::SignalSetup)?,
        })
    }

    /// Wait for the next termination signal.
    ///
    /// Cancel-safe; pending forever if the signal driver has shut down.
    pub async fn recv(&mut self) -> Signal {
        tokio::select! {
            Some(()) = self.interrupt.recv() => Signal::SIGINT,
            Some(()) = self.terminate.recv() => Signal::SIGTERM,
            else => std::future::pending().await,
        }
    }
}
