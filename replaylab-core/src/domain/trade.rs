//! ClosedTrade: an append-only ledger entry for a completed round trip.

use super::order::ExitReason;
use super::position::{Position, PositionSide};
use serde::{Deserialize, Serialize};

/// A completed round trip: entry → exit. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub entry_time: i64,
    pub exit_time: i64,
    pub side: PositionSide,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    pub pnl: f64,
    /// Return on reserved notional, in percent (5.0 = +5%).
    pub return_pct: f64,
    pub exit_reason: ExitReason,
    pub candles_held: usize,
}

impl ClosedTrade {
    /// Record the close of `position` at `exit_price`.
    pub fn from_position(
        position: &Position,
        exit_price: f64,
        exit_time: i64,
        exit_reason: ExitReason,
    ) -> Self {
        let pnl = position.realized_pnl(exit_price);
        let notional = position.notional();
        let return_pct = if notional == 0.0 {
            0.0
        } else {
            pnl / notional * 100.0
        };
        Self {
            entry_time: position.entry_time,
            exit_time,
            side: position.side,
            entry_price: position.entry_price,
            exit_price,
            quantity: position.quantity,
            pnl,
            return_pct,
            exit_reason,
            candles_held: position.candles_held,
        }
    }

    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }
}
