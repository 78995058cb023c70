//! Engine configuration, mutable run state, and run result types.

use crate::domain::{
    ClosedTrade, ExitReason, IdGen, Position, PositionId, PositionSide, Protection,
};
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration for a single replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub initial_capital: f64,
    /// Cap on simultaneously open positions, across both sides.
    pub max_positions: usize,
}

impl EngineConfig {
    pub fn new(initial_capital: f64, max_positions: usize) -> Self {
        Self {
            initial_capital,
            max_positions,
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "initial_capital must be positive, got {}",
                self.initial_capital
            )));
        }
        if self.max_positions == 0 {
            return Err(EngineError::InvalidConfig(
                "max_positions must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(10_000.0, 1)
    }
}

/// Why an order produced no fill. Counted, never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoFillReason {
    /// Quantity was zero, negative or not finite.
    InvalidQuantity,
    /// Limit price outside the bar's [low, high].
    LimitNotReached,
    InsufficientCapital,
    MaxPositions,
    /// `CLOSE` with nothing (of the requested side) open.
    NoMatchingPosition,
}

/// Mutable state for one replay. Created fresh per run and never shared.
#[derive(Debug, Clone)]
pub struct EngineState {
    /// Free capital: initial capital minus reserved notional plus realized PnL.
    pub capital: f64,
    /// Open positions in entry order.
    pub positions: Vec<Position>,
    /// Closed trades in closure order.
    pub trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<f64>,
    pub id_gen: IdGen,
    pub no_fills: BTreeMap<NoFillReason, usize>,
}

impl EngineState {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            capital: initial_capital,
            positions: Vec::new(),
            trades: Vec::new(),
            equity_curve: vec![initial_capital],
            id_gen: IdGen::default(),
            no_fills: BTreeMap::new(),
        }
    }

    pub fn index_of(&self, id: PositionId) -> Option<usize> {
        self.positions.iter().position(|p| p.id == id)
    }

    /// Earliest-opened position, optionally restricted to one side.
    pub fn first_position(&self, side: Option<PositionSide>) -> Option<usize> {
        self.positions
            .iter()
            .position(|p| side.map_or(true, |s| p.side == s))
    }

    /// Reserve capital and record a new position.
    pub fn open_position(
        &mut self,
        side: PositionSide,
        fill_price: f64,
        quantity: f64,
        entry_time: i64,
        protection: Protection,
    ) -> PositionId {
        let id = self.id_gen.next_position_id();
        let position = Position::open(id, side, fill_price, quantity, entry_time, protection);
        self.capital -= position.notional();
        tracing::debug!(%id, %side, fill_price, quantity, "position opened");
        self.positions.push(position);
        id
    }

    /// Close the position at `index`, release its capital and append to the ledger.
    ///
    /// Longs return exit proceeds. Shorts return the reserved notional plus PnL.
    pub fn close_position(
        &mut self,
        index: usize,
        exit_price: f64,
        exit_time: i64,
        reason: ExitReason,
    ) {
        let position = self.positions.remove(index);
        let trade = ClosedTrade::from_position(&position, exit_price, exit_time, reason);
        self.capital += match position.side {
            PositionSide::Long => exit_price * position.quantity,
            PositionSide::Short => position.notional() + trade.pnl,
        };
        tracing::debug!(
            id = %position.id,
            exit_price,
            pnl = trade.pnl,
            reason = %trade.exit_reason,
            "position closed"
        );
        self.trades.push(trade);
    }

    /// Capital plus unrealized PnL of every open position at `price`.
    pub fn equity_at(&self, price: f64) -> f64 {
        self.capital
            + self
                .positions
                .iter()
                .map(|p| p.unrealized_pnl(price))
                .sum::<f64>()
    }

    pub fn record_equity(&mut self, close: f64) {
        let equity = self.equity_at(close);
        self.equity_curve.push(equity);
    }

    pub fn record_no_fill(&mut self, reason: NoFillReason) {
        *self.no_fills.entry(reason).or_default() += 1;
    }

    pub fn into_result(self, initial_capital: f64, bar_count: usize) -> RunResult {
        RunResult {
            initial_capital,
            final_capital: self.capital,
            trades: self.trades,
            equity_curve: self.equity_curve,
            bar_count,
            no_fills: self.no_fills,
        }
    }
}

/// Output of one replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub initial_capital: f64,
    /// Capital after the end-of-backtest liquidation.
    pub final_capital: f64,
    pub trades: Vec<ClosedTrade>,
    /// One point before the first bar, then one per bar.
    pub equity_curve: Vec<f64>,
    pub bar_count: usize,
    pub no_fills: BTreeMap<NoFillReason, usize>,
}
