//! Monofy Core Library
//!
//! Runs several OS processes as one unit:
//! - Command-group parsing (`&&` pre-start steps, `|||` parallel children)
//! - `$NAME` / `${NAME}` environment substitution
//! - Lifecycle coordination with signal forwarding and all-for-one shutdown
//! - Common error types

pub mod command;
pub mod config;
pub mod coordinator;
pub mod env;
pub mod error;
pub mod parser;
pub mod process;
pub mod signals;
pub mod tracing_init;

pub use command::{CommandGroup, CommandSpec};
pub use config::{ExitCodePolicy, SupervisorConfig};
pub use coordinator::{ChildExit, Coordinator, GroupEvent, GroupOutcome, Phase};
pub use env::{EnvLookup, ProcessEnv};
pub use error::{Error, Result};
