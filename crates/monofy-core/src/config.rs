//! Supervisor tunables.
//!
//! The binary fills these from CLI flags with environment-variable fallbacks;
//! library users construct them directly.

use std::time::Duration;

use crate::error::{Error, Result};

/// Interval between two "has any child exited?" rounds.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Upper bound for the poll interval; beyond this shutdown latency gets silly.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// How the supervisor's own exit status is chosen after a normal shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExitCodePolicy {
    /// Always exit 0 once the group has been torn down.
    #[default]
    Zero,
    /// Exit with the status of the child whose exit triggered shutdown.
    FirstExit,
}

/// Runtime configuration for a [`Coordinator`](crate::Coordinator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    pub poll_interval: Duration,
    pub exit_code_policy: ExitCodePolicy,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            exit_code_policy: ExitCodePolicy::default(),
        }
    }
}

impl SupervisorConfig {
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    #[must_use]
    pub const fn with_exit_code_policy(mut self, policy: ExitCodePolicy) -> Self {
        self.exit_code_policy = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(Error::Config("poll interval must be non-zero".to_string()));
        }
        if self.poll_interval > MAX_POLL_INTERVAL {
            return Err(Error::Config(format!(
                "poll interval {:?} exceeds maximum of {:?}",
                self.poll_interval, MAX_POLL_INTERVAL
            )));
        }
        Ok(())
    }
}
