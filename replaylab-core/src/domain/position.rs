//! Position: a directional exposure with entry terms and protective levels.

use super::bar::Bar;
use super::ids::PositionId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionSide {
    Long,
    Short,
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionSide::Long => write!(f, "LONG"),
            PositionSide::Short => write!(f, "SHORT"),
        }
    }
}

/// Protective levels attached to a position at entry.
///
/// `stop_loss` and `take_profit` are absolute prices. `trailing_stop` is a
/// fractional distance (0.03 = 3%) from the bar's favorable extreme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Protection {
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub trailing_stop: Option<f64>,
}

/// A live position.
///
/// Side, entry price, quantity and entry time are fixed at creation. The only
/// mutable state is the candle counter and the stop level (via the trailing
/// ratchet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub side: PositionSide,
    pub entry_price: f64,
    pub quantity: f64,
    pub entry_time: i64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub trailing_stop: Option<f64>,
    pub candles_held: usize,
}

impl Position {
    pub fn open(
        id: PositionId,
        side: PositionSide,
        entry_price: f64,
        quantity: f64,
        entry_time: i64,
        protection: Protection,
    ) -> Self {
        Self {
            id,
            side,
            entry_price,
            quantity,
            entry_time,
            stop_loss: protection.stop_loss,
            take_profit: protection.take_profit,
            trailing_stop: protection.trailing_stop,
            candles_held: 0,
        }
    }

    pub fn is_long(&self) -> bool {
        self.side == PositionSide::Long
    }

    pub fn is_short(&self) -> bool {
        self.side == PositionSide::Short
    }

    /// Capital reserved at entry: cost for longs, margin for shorts.
    pub fn notional(&self) -> f64 {
        self.entry_price * self.quantity
    }

    /// True if a stop is set and the bar trades through it
    /// (low for longs, high for shorts; touching counts).
    pub fn check_stop_loss(&self, bar: &Bar) -> bool {
        match (self.stop_loss, self.side) {
            (Some(stop), PositionSide::Long) => bar.low <= stop,
            (Some(stop), PositionSide::Short) => bar.high >= stop,
            (None, _) => false,
        }
    }

    /// True if a target is set and the bar trades through it
    /// (high for longs, low for shorts; touching counts).
    pub fn check_take_profit(&self, bar: &Bar) -> bool {
        match (self.take_profit, self.side) {
            (Some(target), PositionSide::Long) => bar.high >= target,
            (Some(target), PositionSide::Short) => bar.low <= target,
            (None, _) => false,
        }
    }

    /// Ratchet the stop toward the bar's favorable extreme.
    ///
    /// Longs: candidate = high * (1 - trail), stop only rises.
    /// Shorts: candidate = low * (1 + trail), stop only falls.
    /// A position without a stop adopts the candidate outright.
    pub fn update_trailing_stop(&mut self, bar: &Bar) {
        let Some(trail) = self.trailing_stop else {
            return;
        };
        let candidate = match self.side {
            PositionSide::Long => bar.high * (1.0 - trail),
            PositionSide::Short => bar.low * (1.0 + trail),
        };
        self.stop_loss = Some(match (self.stop_loss, self.side) {
            (None, _) => candidate,
            (Some(current), PositionSide::Long) => current.max(candidate),
            (Some(current), PositionSide::Short) => current.min(candidate),
        });
    }

    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        self.pnl_at(current_price)
    }

    pub fn realized_pnl(&self, exit_price: f64) -> f64 {
        self.pnl_at(exit_price)
    }

    pub fn increment_candles_held(&mut self) {
        self.candles_held += 1;
    }

    fn pnl_at(&self, price: f64) -> f64 {
        match self.side {
            PositionSide::Long => (price - self.entry_price) * self.quantity,
            PositionSide::Short => (self.entry_price - price) * self.quantity,
        }
    }
}
