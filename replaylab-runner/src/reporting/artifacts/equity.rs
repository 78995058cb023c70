//! Equity curve export (CSV).

use anyhow::{Context, Result};
use std::path::Path;

/// `step,equity` rows; step 0 is the initial capital.
pub fn write_equity_csv(path: &Path, equity: &[f64]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create equity CSV {}", path.display()))?;
    writer.write_record(["step", "equity"])?;
    for (step, value) in equity.iter().enumerate() {
        writer.write_record([step.to_string(), value.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}
