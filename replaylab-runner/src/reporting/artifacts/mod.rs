//! Artifact manager for persisting run outputs.
//!
//! Each run lands in `<output_dir>/<run_id>/`:
//! - `result.json`: run id, config and full result
//! - `trades.csv`: the closed-trade ledger
//! - `equity.csv`: one row per equity point

mod equity;
mod report;
mod trades;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::runner::RunReport;

pub use equity::write_equity_csv;
pub use report::write_report_json;
pub use trades::write_trades_csv;

/// Artifact paths returned after export.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub run_dir: PathBuf,
    pub result_json: PathBuf,
    pub trades_csv: PathBuf,
    pub equity_csv: PathBuf,
}

/// Manages writing all artifacts for a run.
#[derive(Debug, Clone)]
pub struct ArtifactManager {
    output_dir: PathBuf,
}

impl ArtifactManager {
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;
        Ok(Self { output_dir })
    }

    /// Save complete run artifacts. Re-saving the same run overwrites in place.
    pub fn save_run(&self, report: &RunReport) -> Result<ArtifactPaths> {
        let run_dir = self.output_dir.join(&report.run_id);
        std::fs::create_dir_all(&run_dir)
            .with_context(|| format!("Failed to create run directory {}", run_dir.display()))?;

        let result_json = run_dir.join("result.json");
        write_report_json(&result_json, report)?;

        let trades_csv = run_dir.join("trades.csv");
        write_trades_csv(&trades_csv, &report.result.trades)?;

        let equity_csv = run_dir.join("equity.csv");
        write_equity_csv(&equity_csv, &report.result.equity_curve)?;

        tracing::debug!(run_dir = %run_dir.display(), "artifacts written");

        Ok(ArtifactPaths {
            run_dir,
            result_json,
            trades_csv,
            equity_csv,
        })
    }
}

/// Write every artifact for `report` under `output_dir`; returns the run directory.
pub fn save_artifacts(report: &RunReport, output_dir: &Path) -> Result<PathBuf> {
    let paths = ArtifactManager::new(output_dir)?.save_run(report)?;
    Ok(paths.run_dir)
}
