//! Report command implementation

use anyhow::{Context, Result};
use pf_expect::write_report;

use crate::cli::GlobalArgs;
use crate::commands::common::load_settings;

/// Execute the report command
pub(crate) async fn execute(global: &GlobalArgs) -> Result<()> {
    let settings = load_settings(global);
    let path = write_report(&settings).context("Failed to write report")?;
    println!("Report written to: {}", path.display());
    Ok(())
}
