//! Priceflow CLI - daily BTC market-data pipeline

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::Cli;
use commands::common::ExitCode;
use commands::{backfill, daemon, freshness, init, ls, materialize, report, validate};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    match dispatch(&cli).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<ExitCode>() {
            Some(ExitCode(code)) => std::process::ExitCode::from(*code),
            None => {
                eprintln!("Error: {:#}", err);
                std::process::ExitCode::FAILURE
            }
        },
    }
}

async fn dispatch(cli: &Cli) -> Result<()> {
    match &cli.command {
        cli::Commands::Init => init::execute(&cli.global).await,
        cli::Commands::Ls(args) => ls::execute(args, &cli.global).await,
        cli::Commands::Materialize(args) => materialize::execute(args, &cli.global).await,
        cli::Commands::Backfill(args) => backfill::execute(args, &cli.global).await,
        cli::Commands::Validate => validate::execute(&cli.global).await,
        cli::Commands::Report => report::execute(&cli.global).await,
        cli::Commands::Freshness(args) => freshness::execute(args, &cli.global).await,
        cli::Commands::Daemon(args) => daemon::execute(args, &cli.global).await,
    }
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `-v`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
