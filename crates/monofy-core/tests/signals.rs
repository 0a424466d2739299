#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Signal registration delivers process-directed SIGINT/SIGTERM to the
//! receiver instead of terminating the test process.
//!
//! Kept in its own test binary so no other test shares the process while it
//! signals itself.

use std::time::Duration;

use monofy_core::signals::TerminationSignals;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;

#[tokio::test]
async fn registered_signals_are_received() {
    let mut signals = TerminationSignals::register().unwrap();

    for sig in [Signal::SIGTERM, Signal::SIGINT] {
        kill(Pid::this(), sig).unwrap();
        let received = tokio::time::timeout(Duration::from_secs(5), signals.recv())
            .await
            .expect("signal should be delivered");
        assert_eq!(received, sig);
    }
}
