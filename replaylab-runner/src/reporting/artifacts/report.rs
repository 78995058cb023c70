//! Full run report export (JSON).

use anyhow::{Context, Result};
use std::path::Path;

use crate::runner::RunReport;

pub fn write_report_json(path: &Path, report: &RunReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize run report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write run report {}", path.display()))?;
    Ok(())
}
