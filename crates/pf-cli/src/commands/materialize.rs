//! Materialize command implementation

use anyhow::{Context, Result};
use pf_pipeline::{run_job, RunConfig};

use crate::cli::{GlobalArgs, MaterializeArgs, RunOutput};
use crate::commands::common::{
    exit_on_failure, load_definitions, load_settings, parse_partition, print_run_result,
};

/// Execute the materialize command
pub async fn execute(args: &MaterializeArgs, global: &GlobalArgs) -> Result<()> {
    let settings = load_settings(global);
    let defs = load_definitions()?;
    let partition = parse_partition(&args.partition)?;
    let config = RunConfig {
        deterministic: args.deterministic,
    };

    let result = run_job(&settings, &defs, partition, config, args.select.as_deref())
        .await
        .with_context(|| format!("Failed to materialize partition {}", partition))?;

    match args.output {
        RunOutput::Text => print_run_result(&result),
        RunOutput::Json => println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialize run result")?
        ),
    }

    exit_on_failure(std::slice::from_ref(&result))
}
