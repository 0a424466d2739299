//! Command-group data model.

use std::fmt;

use crate::env::EnvLookup;
use crate::parser;

/// Token separating successive pre-start commands.
pub const SEQUENTIAL_SEPARATOR: &str = "&&";

/// Token separating successive parallel-group commands.
pub const PARALLEL_SEPARATOR: &str = "|||";

/// Argument vector for a single child process.
///
/// An empty spec is a valid parse result but cannot be spawned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec(Vec<String>);

impl CommandSpec {
    pub const fn new(argv: Vec<String>) -> Self {
        Self(argv)
    }

    /// The executable to run, if any.
    pub fn program(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Arguments after the program name.
    pub fn args(&self) -> &[String] {
        self.0.get(1..).unwrap_or_default()
    }

    pub fn argv(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub(crate) fn push(&mut self, token: String) {
        self.0.push(token);
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

impl<S: Into<String>> FromIterator<S> for CommandSpec {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// The parsed form of a monofy invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandGroup {
    /// Commands run one at a time, in order, before the parallel group starts.
    pub pre_start: Vec<CommandSpec>,
    /// Commands started together and monitored as siblings. Never empty.
    pub parallel: Vec<CommandSpec>,
}

impl CommandGroup {
    /// Parse an argument vector (without the program name) into a group.
    pub fn parse<E: EnvLookup + ?Sized>(args: &[String], env: &E) -> Self {
        Self {
            pre_start: parser::parse_pre_start(args, env),
            parallel: parser::parse_parallel(args, env),
        }
    }
}
