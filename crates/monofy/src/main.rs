//! Monofy
//!
//! Runs one or more commands as a single unit, e.g. several services in one
//! container: optional pre-start steps separated by `&&`, then parallel
//! children separated by `|||`. Termination signals are forwarded to every
//! child, and when any child exits the others are terminated.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::info;

use monofy_core::tracing_init::init_tracing;
use monofy_core::{CommandGroup, Coordinator, ExitCodePolicy, ProcessEnv, SupervisorConfig};

/// Exit status convention after a normal group shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ExitCodeArg {
    /// Exit 0 once every child has been reaped
    Zero,
    /// Exit with the status of the child that exited first
    FirstExit,
}

impl From<ExitCodeArg> for ExitCodePolicy {
    fn from(arg: ExitCodeArg) -> Self {
        match arg {
            ExitCodeArg::Zero => Self::Zero,
            ExitCodeArg::FirstExit => Self::FirstExit,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "monofy")]
#[command(
    version,
    about = "Run several processes as one: forward signals, stop all when one exits",
    override_usage = "monofy [OPTIONS] <COMMAND>... ['&&' <COMMAND>...]... ['|||' <COMMAND>...]..."
)]
struct Args {
    /// Milliseconds between checks for exited children
    #[arg(long, default_value_t = 50, env = "MONOFY_POLL_INTERVAL_MS")]
    poll_interval_ms: u64,

    /// Exit status after a normal shutdown
    #[arg(long, value_enum, default_value_t = ExitCodeArg::Zero, env = "MONOFY_EXIT_CODE")]
    exit_code: ExitCodeArg,

    /// Log level filter (e.g. "info", "debug", "warn").
    #[arg(long, default_value = "info", env = "MONOFY_LOG_LEVEL")]
    log_level: String,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long, env = "MONOFY_LOG_JSON")]
    log_json: bool,

    /// Commands to run. `&&` separates pre-start steps, `|||` parallel children.
    /// `$NAME` and `${NAME}` are replaced with environment values.
    #[arg(
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    command: Vec<String>,
}

impl Args {
    fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig::default()
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_exit_code_policy(self.exit_code.into())
    }
}

async fn run(args: Args) -> anyhow::Result<i32> {
    let config = args.supervisor_config();
    config.validate().context("invalid options")?;

    let group = CommandGroup::parse(&args.command, &ProcessEnv);
    info!(
        pre_start = group.pre_start.len(),
        parallel = group.parallel.len(),
        "Parsed command group"
    );

    let policy = config.exit_code_policy;
    let outcome = Coordinator::new(group, config).run().await?;
    info!(
        pid = outcome.first_exit.pid,
        command = %outcome.first_exit.command,
        status = %outcome.first_exit.status,
        "Command group stopped"
    );
    Ok(outcome.exit_code(policy))
}

/// Truncate to the 0-255 range the OS reports, as `exit(3)` does.
fn status_byte(code: i32) -> u8 {
    u8::try_from(code.rem_euclid(256)).unwrap_or(1)
}

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = init_tracing(&args.log_level, args.log_json) {
        eprintln!("monofy: {e}");
        return ExitCode::FAILURE;
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = std::process::id(),
        "Starting monofy"
    );

    match run(args).await {
        Ok(code) => ExitCode::from(status_byte(code)),
        Err(e) => {
            eprintln!("monofy: {e:#}");
            let code = e
                .downcast_ref::<monofy_core::Error>()
                .map_or(1, monofy_core::Error::exit_code);
            ExitCode::from(status_byte(code))
        }
    }
}
