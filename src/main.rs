//! ecs-rollout CLI
//!
//! Usage: ecs-rollout <COMMAND>
//!
//! Commands:
//!   ecs deploy|scale|run|update|cron   Container service operations
//!   code-deploy deploy                 Blue/green deployments

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ecs_rollout::domain::ports::StopSignal;
use ecs_rollout::error::exit_codes;
use ecs_rollout::presentation::{self, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let stop = StopSignal::new();
    let on_interrupt = stop.clone();
    ctrlc::set_handler(move || {
        // Outside a watch nothing polls the flag, so stop right here
        if !on_interrupt.interrupt() {
            std::process::exit(exit_codes::ABORTED);
        }
    })
    .context("failed to install Ctrl+C handler")?;

    let code = presentation::execute(&cli, stop);
    std::process::exit(code);
}

/// Diagnostics go to stderr; `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "warn,ecs_rollout=debug",
        _ => "warn,ecs_rollout=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
