//! Lifecycle coordinator for a command group.
//!
//! Drives one group through
//! `PRESTART -> STARTING -> RUNNING -> SHUTTING_DOWN -> DONE`:
//!
//! 1. Pre-start commands run one at a time; the first non-zero exit aborts.
//! 2. Termination-signal handlers are installed, then every parallel command
//!    is spawned in order.
//! 3. Children are polled on a fixed interval. Received SIGINT/SIGTERM are
//!    forwarded to every child still tracked.
//! 4. The first child observed to exit ends the group: all others get
//!    SIGTERM exactly once.
//! 5. Every child is reaped before [`Coordinator::run`] returns, including
//!    after a spawn failure.
//!
//! Within one poll round children are checked in group order, so when several
//! exit between two rounds the lowest index counts as the first exit.

use std::fmt;
use std::process::ExitStatus;

use nix::sys::signal::Signal;
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::command::{CommandGroup, CommandSpec};
use crate::config::{ExitCodePolicy, SupervisorConfig};
use crate::error::{Error, Result};
use crate::process::{self, ChildHandle};
use crate::signals::TerminationSignals;

/// Coordinator state machine phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PreStart,
    Starting,
    Running,
    ShuttingDown,
    Done,
}

impl Phase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PreStart => "PRESTART",
            Self::Starting => "STARTING",
            Self::Running => "RUNNING",
            Self::ShuttingDown => "SHUTTING_DOWN",
            Self::Done => "DONE",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observable progress of a group, delivered to an optional observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupEvent {
    PhaseChanged(Phase),
    /// A pre-start command is about to run.
    PreStart { command: CommandSpec },
    /// A parallel child was spawned.
    Started {
        index: usize,
        pid: u32,
        command: CommandSpec,
    },
    /// A signal was handed to the kernel for this child.
    Signalled {
        index: usize,
        pid: u32,
        signal: Signal,
    },
    /// The exit that ends the group.
    FirstExit {
        index: usize,
        pid: u32,
        status: ExitStatus,
    },
    /// A child has been fully waited on.
    Reaped {
        index: usize,
        pid: u32,
        status: ExitStatus,
    },
}

/// Final state of one parallel child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildExit {
    pub index: usize,
    pub pid: u32,
    pub command: CommandSpec,
    pub status: ExitStatus,
}

/// Result of a group that started and shut down normally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupOutcome {
    /// The child whose exit triggered shutdown.
    pub first_exit: ChildExit,
    /// Every reaped child, in parallel-group order.
    pub exits: Vec<ChildExit>,
}

impl GroupOutcome {
    /// Supervisor exit status under `policy`.
    pub fn exit_code(&self, policy: ExitCodePolicy) -> i32 {
        match policy {
            ExitCodePolicy::Zero => 0,
            ExitCodePolicy::FirstExit => process::exit_code(self.first_exit.status),
        }
    }
}

/// Owns every child of one command group for its whole lifetime.
pub struct Coordinator {
    group: CommandGroup,
    config: SupervisorConfig,
    /// Spawned and not yet reaped.
    children: Vec<ChildHandle>,
    exits: Vec<ChildExit>,
    phase: Phase,
    events: Option<mpsc::UnboundedSender<GroupEvent>>,
}

impl Coordinator {
    pub const fn new(group: CommandGroup, config: SupervisorConfig) -> Self {
        Self {
            group,
            config,
            children: Vec::new(),
            exits: Vec::new(),
            phase: Phase::PreStart,
            events: None,
        }
    }

    /// Report progress to `events`. A dropped receiver is ignored.
    #[must_use]
    pub fn with_events(mut self, events: mpsc::UnboundedSender<GroupEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Run the group to completion.
    ///
    /// Returns an error if a pre-start command fails, if any parallel child
    /// cannot be spawned, or if polling a child fails. In the latter two cases
    /// the children that did start are signalled and reaped first.
    pub async fn run(mut self) -> Result<GroupOutcome> {
        self.config.validate()?;
        self.run_pre_start().await?;

        self.transition(Phase::Starting);
        let mut signals = TerminationSignals::register()?;

        let result = match self.start_children() {
            Ok(()) => self.monitor(&mut signals).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            error!(error = %e, "Command group failed, terminating started children");
            self.terminate_children();
        }

        self.transition(Phase::Done);
        self.reap_all(&mut signals).await;

        let first_exit = result?;
        let mut exits = self.exits;
        exits.sort_by_key(|exit| exit.index);
        Ok(GroupOutcome { first_exit, exits })
    }

    async fn run_pre_start(&self) -> Result<()> {
        for spec in &self.group.pre_start {
            info!(command = %spec, "Running pre-start process");
            self.emit(GroupEvent::PreStart {
                command: spec.clone(),
            });
            let status = process::run_to_completion(spec).await?;
            if !status.success() {
                let code = process::exit_code(status);
                error!(command = %spec, status = code, "Pre-start process failed");
                return Err(Error::PreStartCommandFailed {
                    command: spec.to_string(),
                    status: code,
                });
            }
            debug!(command = %spec, "Pre-start process finished");
        }
        Ok(())
    }

    fn start_children(&mut self) -> Result<()> {
        for (index, spec) in self.group.parallel.iter().enumerate() {
            let child = ChildHandle::spawn(index, spec)?;
            info!(pid = child.pid(), command = %spec, "Started process");
            self.emit(GroupEvent::Started {
                index,
                pid: child.pid(),
                command: spec.clone(),
            });
            self.children.push(child);
        }
        self.transition(Phase::Running);
        Ok(())
    }

    /// Poll until the first child exits, forwarding signals meanwhile.
    async fn monitor(&mut self, signals: &mut TerminationSignals) -> Result<ChildExit> {
        let mut ticker = self.ticker();
        loop {
            tokio::select! {
                sig = signals.recv() => self.forward(sig),
                _ = ticker.tick() => {
                    if let Some(first) = self.poll_first_exit()? {
                        self.transition(Phase::ShuttingDown);
                        self.terminate_children();
                        return Ok(first);
                    }
                }
            }
        }
    }

    /// One poll round: reap and return the first exited child, if any.
    fn poll_first_exit(&mut self) -> Result<Option<ChildExit>> {
        for pos in 0..self.children.len() {
            if let Some(status) = self.children[pos].try_wait()? {
                let child = self.children.remove(pos);
                info!(
                    pid = child.pid(),
                    command = %child.command(),
                    status = process::exit_code(status),
                    "Process exited, shutting down group"
                );
                self.emit(GroupEvent::FirstExit {
                    index: child.index(),
                    pid: child.pid(),
                    status,
                });
                return Ok(Some(self.record_exit(&child, status)));
            }
        }
        Ok(None)
    }

    /// Wait for every remaining child, forwarding signals meanwhile.
    async fn reap_all(&mut self, signals: &mut TerminationSignals) {
        let mut ticker = self.ticker();
        while !self.children.is_empty() {
            tokio::select! {
                sig = signals.recv() => self.forward(sig),
                _ = ticker.tick() => self.reap_round(),
            }
        }
        debug!(reaped = self.exits.len(), "All children reaped");
    }

    fn reap_round(&mut self) {
        let mut running = Vec::with_capacity(self.children.len());
        for mut child in std::mem::take(&mut self.children) {
            match child.try_wait() {
                Ok(Some(status)) => {
                    self.record_exit(&child, status);
                }
                Ok(None) => running.push(child),
                Err(e) => {
                    warn!(pid = child.pid(), error = %e, "Giving up on child");
                }
            }
        }
        self.children = running;
    }

    fn record_exit(&mut self, child: &ChildHandle, status: ExitStatus) -> ChildExit {
        debug!(pid = child.pid(), ?status, "Reaped child");
        self.emit(GroupEvent::Reaped {
            index: child.index(),
            pid: child.pid(),
            status,
        });
        let exit = ChildExit {
            index: child.index(),
            pid: child.pid(),
            command: child.command().clone(),
            status,
        };
        self.exits.push(exit.clone());
        exit
    }

    /// Send `sig` to every child still tracked.
    fn forward(&self, sig: Signal) {
        debug!(signal = %sig, children = self.children.len(), "Forwarding signal");
        self.signal_all(sig);
    }

    /// SIGTERM every tracked child. The child that ended the group has
    /// already been removed from tracking.
    fn terminate_children(&self) {
        self.signal_all(Signal::SIGTERM);
    }

    fn signal_all(&self, sig: Signal) {
        for child in &self.children {
            if child.signal(sig) {
                self.emit(GroupEvent::Signalled {
                    index: child.index(),
                    pid: child.pid(),
                    signal: sig,
                });
            }
        }
    }

    fn ticker(&self) -> Interval {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    fn transition(&mut self, next: Phase) {
        debug!(from = %self.phase, to = %next, "Phase transition");
        self.phase = next;
        self.emit(GroupEvent::PhaseChanged(next));
    }

    fn emit(&self, event: GroupEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}
