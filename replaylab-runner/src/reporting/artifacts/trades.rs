//! Trade ledger export (CSV).

use anyhow::{Context, Result};
use replaylab_core::domain::ClosedTrade;
use std::path::Path;

/// One row per closed trade, header taken from the ledger field names.
pub fn write_trades_csv(path: &Path, trades: &[ClosedTrade]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create trades CSV {}", path.display()))?;
    if trades.is_empty() {
        writer.write_record([
            "entry_time",
            "exit_time",
            "side",
            "entry_price",
            "exit_price",
            "quantity",
            "pnl",
            "return_pct",
            "exit_reason",
            "candles_held",
        ])?;
    }
    for trade in trades {
        writer
            .serialize(trade)
            .with_context(|| format!("Failed to write trade to {}", path.display()))?;
    }
    writer.flush()?;
    Ok(())
}
