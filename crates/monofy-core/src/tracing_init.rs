//! Logging setup for the supervisor.
//!
//! Diagnostics are written to stderr. Children inherit the supervisor's
//! stdout untouched, so their output never interleaves with monofy's.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Error, Result};

/// Filter used when `RUST_LOG` is unset: `level` for the binary and this crate,
/// nothing from dependencies.
pub fn default_filter(level: &str) -> String {
    format!("monofy={level},monofy_core={level}")
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(level)))
}

/// Install the global subscriber. `json` selects one JSON object per line.
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(level: &str, json: bool) -> Result<()> {
    let text = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    let structured = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(text)
        .with(structured)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_covers_both_crates() {
        assert_eq!(default_filter("debug"), "monofy=debug,monofy_core=debug");
    }

    #[test]
    fn second_init_is_an_error() {
        // The first call may already have happened in another test of this
        // binary; either way the next one must fail cleanly.
        let _ = init_tracing("warn", false);
        assert!(matches!(init_tracing("warn", true), Err(Error::Logging(_))));
    }
}
