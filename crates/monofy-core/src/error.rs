//! Error types for the monofy core library.

use thiserror::Error;

/// Result type alias using monofy's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal conditions that abort a command group.
///
/// A running child exiting, whatever its status, is not an error: it is the
/// trigger for group shutdown and is reported through
/// [`GroupOutcome`](crate::GroupOutcome) instead.
#[derive(Debug, Error)]
pub enum Error {
    /// A pre-start command exited unsuccessfully.
    #[error("pre-start command `{command}` failed with exit status {status}")]
    PreStartCommandFailed { command: String, status: i32 },

    /// The OS refused to create a child process.
    #[error("failed to start `{command}`: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Polling a child for its exit status failed.
    #[error("failed to wait for process {pid}: {source}")]
    Wait {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    /// Termination signal handlers could not be installed.
    #[error("failed to install signal handlers: {0}")]
    SignalSetup(#[source] std::io::Error),

    /// The tracing subscriber could not be installed.
    #[error("Logging setup error: {0}")]
    Logging(String),

    /// Invalid supervisor configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Exit status the supervisor should terminate with for this error.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::PreStartCommandFailed { status, .. } => *status,
            _ => 1,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn pre_start_failure_propagates_status() {
        let err = Error::PreStartCommandFailed {
            command: "migrate --check".to_string(),
            status: 3,
        };
        assert_eq!(err.exit_code(), 3);
        assert_eq!(
            err.to_string(),
            "pre-start command `migrate --check` failed with exit status 3"
        );
    }

    #[test]
    fn other_errors_exit_with_one() {
        let err = Error::SpawnFailed {
            command: "nope".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().starts_with("failed to start `nope`"));

        assert_eq!(Error::Config("bad".into()).exit_code(), 1);
    }

    #[test]
    fn spawn_failure_keeps_source() {
        use std::error::Error as _;

        let err = Error::SpawnFailed {
            command: "x".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        let source = err.source().unwrap();
        assert!(source.to_string().to_lowercase().contains("permission"));
    }
}
