//! Init command implementation - scaffolds the files a run needs

use anyhow::{Context, Result};
use pf_core::settings::Settings;
use pf_expect::DEFAULT_SUITES;
use pf_pipeline::SAMPLE_PAYLOAD;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;
use crate::commands::common::load_settings;

/// Execute the init command
pub(crate) async fn execute(global: &GlobalArgs) -> Result<()> {
    let settings = load_settings(global);
    println!(
        "Initializing Priceflow project in {}\n",
        settings.project_root.display()
    );

    for (path, created) in scaffold(&settings)? {
        let status = if created { "created" } else { "exists, kept" };
        println!("  {:<13} {}", status, path.display());
    }

    println!("\nNext: pf materialize --partition <YYYY-MM-DD> --deterministic");
    Ok(())
}

/// Write the sample payload and default suites, never overwriting.
///
/// Returns each path with whether it was created.
pub(crate) fn scaffold(settings: &Settings) -> Result<Vec<(PathBuf, bool)>> {
    let mut files = vec![(settings.sample_api_payload.clone(), SAMPLE_PAYLOAD)];
    let suites_dir = settings.suites_dir();
    for (name, json) in DEFAULT_SUITES {
        files.push((suites_dir.join(format!("{name}.json")), json));
    }

    fs::create_dir_all(&settings.reports_dir).with_context(|| {
        format!(
            "Failed to create directory: {}",
            settings.reports_dir.display()
        )
    })?;

    let mut written = Vec::with_capacity(files.len());
    for (path, content) in files {
        let created = write_if_missing(&path, content)?;
        written.push((path, created));
    }
    Ok(written)
}

fn write_if_missing(path: &Path, content: &str) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
#[path = "init_test.rs"]
mod tests;
