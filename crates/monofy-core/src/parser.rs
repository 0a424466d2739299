//! Command-group parser.
//!
//! Splits monofy's own argument vector into the pre-start sequence (split on
//! `&&`) and the parallel group (split on `|||`). Sequential separators take
//! precedence: the parallel group is parsed only from the tokens following the
//! last `&&`. Separators are matched on the raw token, before substitution.
//!
//! ```text
//! migrate && collectstatic && gunicorn ||| worker
//! `-pre-1-` `--pre-2-----`    `-par-1-`    `par-2`
//! ```

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::command::{CommandSpec, PARALLEL_SEPARATOR, SEQUENTIAL_SEPARATOR};
use crate::env::EnvLookup;

/// Matches `${NAME}` (group 1) or `$NAME` (group 2).
static ENV_VAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
        .expect("static regex is valid")
});

/// Replace every `$NAME` and `${NAME}` in `token` with its environment value.
///
/// Undefined names substitute to the empty string. Substituted values are not
/// rescanned.
pub fn substitute_env_vars<E: EnvLookup + ?Sized>(token: &str, env: &E) -> String {
    ENV_VAR_RE
        .replace_all(token, |caps: &Captures<'_>| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .and_then(|name| env.lookup(name.as_str()))
                .unwrap_or_default()
        })
        .into_owned()
}

/// Commands to run sequentially before the parallel group.
///
/// `&&` acts as a terminator: the tokens after the last one are left for
/// [`parse_parallel`], so input without `&&` yields an empty sequence.
pub fn parse_pre_start<E: EnvLookup + ?Sized>(args: &[String], env: &E) -> Vec<CommandSpec> {
    let mut result = Vec::new();
    let mut current = CommandSpec::default();
    for arg in args {
        if arg == SEQUENTIAL_SEPARATOR {
            result.push(std::mem::take(&mut current));
        } else {
            current.push(substitute_env_vars(arg, env));
        }
    }
    result
}

/// Commands to start together as the parallel group.
///
/// Always returns at least one (possibly empty) spec.
pub fn parse_parallel<E: EnvLookup + ?Sized>(args: &[String], env: &E) -> Vec<CommandSpec> {
    let tail = args
        .iter()
        .rposition(|arg| arg == SEQUENTIAL_SEPARATOR)
        .map_or(args, |last| &args[last + 1..]);

    let mut result = vec![CommandSpec::default()];
    for arg in tail {
        if arg == PARALLEL_SEPARATOR {
            result.push(CommandSpec::default());
        } else if let Some(current) = result.last_mut() {
            current.push(substitute_env_vars(arg, env));
        }
    }
    result
}
