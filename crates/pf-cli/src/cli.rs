//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Priceflow - daily BTC market-data pipeline
#[derive(Parser, Debug)]
#[command(name = "pf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project root that default paths resolve against
    #[arg(short = 'p', long, global = true, default_value = ".", env = "PF_PROJECT_DIR")]
    pub project_dir: String,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scaffold the sample payload and expectation suites
    Init,

    /// List assets, checks, jobs and schedules
    Ls(LsArgs),

    /// Materialize assets for one partition
    Materialize(MaterializeArgs),

    /// Materialize every partition in a date range
    Backfill(BackfillArgs),

    /// Validate the newest cleaned and aggregated partitions
    Validate,

    /// Render the Markdown report from the last validation
    Report,

    /// Check each asset's newest partition against its freshness policy
    Freshness(FreshnessArgs),

    /// Run the daily schedule until interrupted
    Daemon(DaemonArgs),
}

/// Table or JSON output
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableOutput {
    /// Table format
    Table,
    /// JSON output
    Json,
}

/// Text or JSON output
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutput {
    /// Human-readable summary
    Text,
    /// JSON run result
    Json,
}

/// Arguments for the ls command
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: TableOutput,
}

/// Arguments for the materialize command
#[derive(Args, Debug)]
pub struct MaterializeArgs {
    /// Partition date (YYYY-MM-DD)
    #[arg(long)]
    pub partition: String,

    /// Replay the sample payload instead of calling the market-data API
    #[arg(long)]
    pub deterministic: bool,

    /// Asset selector (+asset, asset+, comma-separated)
    #[arg(short, long)]
    pub select: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: RunOutput,
}

/// Arguments for the backfill command
#[derive(Args, Debug)]
pub struct BackfillArgs {
    /// First partition date (inclusive)
    #[arg(long)]
    pub start: String,

    /// Last partition date (inclusive)
    #[arg(long)]
    pub end: String,

    /// Replay the sample payload instead of calling the market-data API
    #[arg(long)]
    pub deterministic: bool,
}

/// Arguments for the freshness command
#[derive(Args, Debug)]
pub struct FreshnessArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: TableOutput,
}

/// Arguments for the daemon command
#[derive(Args, Debug)]
pub struct DaemonArgs {
    /// Replay the sample payload instead of calling the market-data API
    #[arg(long)]
    pub deterministic: bool,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
