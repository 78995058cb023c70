//! CSV bar files: offline replay input and the `fetch` command's output.
//!
//! Format is a header row `timestamp,open,high,low,close,volume` followed by
//! one bar per line, timestamps in Unix ms, non-decreasing.

use super::provider::{ensure_time_ordered, BarRequest, Broker, DataError};
use crate::domain::Bar;
use std::path::{Path, PathBuf};

/// Reads one symbol's bars from a CSV file. The request's symbol is not
/// checked against the file contents.
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Broker for CsvSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, request: &BarRequest) -> Result<Vec<Bar>, DataError> {
        let bars = read_bars_csv(&self.path)?;
        Ok(request.apply_window(bars))
    }
}

/// Read a whole bar file, rejecting out-of-order rows.
pub fn read_bars_csv(path: &Path) -> Result<Vec<Bar>, DataError> {
    let mut reader = csv::Reader::from_path(path)?;
    let bars = reader
        .deserialize::<Bar>()
        .collect::<Result<Vec<_>, _>>()?;
    ensure_time_ordered(&bars)?;
    tracing::debug!(path = %path.display(), count = bars.len(), "read bar file");
    Ok(bars)
}

/// Write bars with a header row.
pub fn write_bars_csv(path: &Path, bars: &[Bar]) -> Result<(), DataError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut writer = csv::Writer::from_path(path)?;
    for bar in bars {
        writer.serialize(bar)?;
    }
    writer.flush()?;
    Ok(())
}
