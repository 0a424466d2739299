//! Helpers for tests that deliver termination signals to the test process.
//!
//! Each such test lives in its own test binary: a signal sent to
//! `Pid::this()` reaches every coordinator registered in the process.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::path::Path;
use std::time::Duration;

use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tokio::sync::mpsc;

use monofy_core::{CommandGroup, CommandSpec, Coordinator, GroupEvent, GroupOutcome, SupervisorConfig};

/// A shell that appends `marker` to `log` on SIGINT and then exits 0.
/// SIGTERM is ignored, so first-exit shutdown cannot end it before the
/// SIGINT trap has run.
pub fn interrupt_logger(marker: &str, log: &Path) -> CommandSpec {
    let script = format!(
        "trap 'echo {marker} >> {log}; exit 0' INT; trap '' TERM; while :; do sleep 0.05; done",
        log = log.display()
    );
    ["sh", "-c", script.as_str()].into_iter().collect()
}

/// Run `group`, and send `sig` to this process once `trigger` matches an
/// event. Returns the group result and every event observed.
pub async fn run_and_signal(
    group: CommandGroup,
    trigger: impl Fn(&GroupEvent) -> bool,
    sig: Signal,
) -> (monofy_core::Result<GroupOutcome>, Vec<GroupEvent>) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let config = SupervisorConfig::default().with_poll_interval(Duration::from_millis(10));
    let coordinator = Coordinator::new(group, config).with_events(tx);

    let observer = async move {
        let mut events = Vec::new();
        let mut sent = false;
        while let Some(event) = rx.recv().await {
            let fire = !sent && trigger(&event);
            events.push(event);
            if fire {
                // Let the shells install their traps.
                tokio::time::sleep(Duration::from_millis(300)).await;
                kill(Pid::this(), sig).unwrap();
                sent = true;
            }
        }
        events
    };

    tokio::time::timeout(Duration::from_secs(20), async {
        tokio::join!(coordinator.run(), observer)
    })
    .await
    .expect("coordinator should finish")
}

/// Indices that received `sig`, sorted.
pub fn signalled_with(events: &[GroupEvent], sig: Signal) -> Vec<usize> {
    let mut indices: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            GroupEvent::Signalled { index, signal, .. } if *signal == sig => Some(*index),
            _ => None,
        })
        .collect();
    indices.sort_unstable();
    indices
}

/// Markers written to `log`, sorted.
pub fn markers(log: &Path) -> Vec<String> {
    let mut lines: Vec<String> = std::fs::read_to_string(log)
        .unwrap_or_default()
        .lines()
        .map(ToString::to_string)
        .collect();
    lines.sort();
    lines
}
