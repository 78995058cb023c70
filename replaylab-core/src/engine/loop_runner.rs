//! Bar-by-bar replay loop, the heart of the backtesting engine.
//!
//! Three phases per bar:
//! 1. Protective exits: age positions, ratchet trailing stops, then stop-loss
//!    before take-profit, each filling at its own level
//! 2. Strategy: one `on_bar` call, orders resolved in submission order
//! 3. Post-bar: mark-to-market at the close, append to the equity curve
//!
//! After the last bar every open position is liquidated at the final close.

use super::fill::resolve_fill_price;
use super::state::{EngineConfig, EngineState, NoFillReason, RunResult};
use crate::domain::{Bar, EntryTerms, ExitReason, OrderRequest, PositionId, PositionSide, Protection};
use crate::error::EngineError;
use crate::strategy::Strategy;

/// Replays bars through a strategy. Holds only configuration, so one engine
/// can run any number of independent replays.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one replay over `bars`.
    ///
    /// Fails with `NoData` on an empty series before touching any state.
    /// Everything else that can go wrong with an order is a silent no-fill.
    pub fn run(&self, strategy: &mut dyn Strategy, bars: &[Bar]) -> Result<RunResult, EngineError> {
        let Some(last) = bars.last() else {
            return Err(EngineError::NoData);
        };
        self.config.validate()?;
        strategy.initialize()?;

        tracing::info!(
            strategy = strategy.name(),
            bars = bars.len(),
            initial_capital = self.config.initial_capital,
            max_positions = self.config.max_positions,
            "starting replay"
        );

        let mut state = EngineState::new(self.config.initial_capital);

        for bar in bars {
            // ─── Phase 1: Protective exits ───
            self.manage_open_positions(&mut state, bar);

            // ─── Phase 2: Strategy ───
            for order in strategy.on_bar(bar).into_orders() {
                self.execute_order(&mut state, order, bar);
            }

            // ─── Phase 3: Post-bar ───
            state.record_equity(bar.close);
        }

        // ─── End of backtest ───
        while !state.positions.is_empty() {
            state.close_position(0, last.close, last.timestamp, ExitReason::EndOfBacktest);
        }

        tracing::info!(
            trades = state.trades.len(),
            final_capital = state.capital,
            "replay finished"
        );
        Ok(state.into_result(self.config.initial_capital, bars.len()))
    }

    /// Visit each position open at the start of the bar exactly once.
    fn manage_open_positions(&self, state: &mut EngineState, bar: &Bar) {
        let ids: Vec<PositionId> = state.positions.iter().map(|p| p.id).collect();
        for id in ids {
            let Some(index) = state.index_of(id) else {
                continue;
            };
            let position = &mut state.positions[index];
            position.increment_candles_held();
            position.update_trailing_stop(bar);

            let exit = if position.check_stop_loss(bar) {
                position.stop_loss.map(|price| (price, ExitReason::StopLoss))
            } else if position.check_take_profit(bar) {
                position.take_profit.map(|price| (price, ExitReason::TakeProfit))
            } else {
                None
            };

            if let Some((price, reason)) = exit {
                state.close_position(index, price, bar.timestamp, reason);
            }
        }
    }

    fn execute_order(&self, state: &mut EngineState, order: OrderRequest, bar: &Bar) {
        match order {
            OrderRequest::CloseAll(terms) => {
                let reason = terms.exit_reason.unwrap_or_default();
                while !state.positions.is_empty() {
                    state.close_position(0, bar.close, bar.timestamp, reason.clone());
                }
            }
            OrderRequest::Close(terms) => {
                let Some(index) = state.first_position(terms.position_side) else {
                    return no_fill(state, NoFillReason::NoMatchingPosition, "CLOSE", bar);
                };
                let Some(price) = resolve_fill_price(terms.order_type, terms.price, bar) else {
                    return no_fill(state, NoFillReason::LimitNotReached, "CLOSE", bar);
                };
                let reason = terms.exit_reason.unwrap_or_default();
                state.close_position(index, price, bar.timestamp, reason);
            }
            OrderRequest::Buy(terms) => {
                self.open_position(state, PositionSide::Long, &terms, bar, "BUY");
            }
            // An open long turns SELL into an exit; otherwise it opens a short.
            OrderRequest::Sell(terms) => match state.first_position(Some(PositionSide::Long)) {
                Some(index) => {
                    let Some(price) = resolve_fill_price(terms.order_type, terms.price, bar) else {
                        return no_fill(state, NoFillReason::LimitNotReached, "SELL", bar);
                    };
                    let reason = terms.exit_reason.unwrap_or_default();
                    state.close_position(index, price, bar.timestamp, reason);
                }
                None => self.open_position(state, PositionSide::Short, &terms, bar, "SELL"),
            },
        }
    }

    fn open_position(
        &self,
        state: &mut EngineState,
        side: PositionSide,
        terms: &EntryTerms,
        bar: &Bar,
        action: &str,
    ) {
        if !(terms.quantity.is_finite() && terms.quantity > 0.0) {
            return no_fill(state, NoFillReason::InvalidQuantity, action, bar);
        }
        let Some(fill_price) = resolve_fill_price(terms.order_type, terms.price, bar) else {
            return no_fill(state, NoFillReason::LimitNotReached, action, bar);
        };
        if fill_price * terms.quantity > state.capital {
            return no_fill(state, NoFillReason::InsufficientCapital, action, bar);
        }
        if state.positions.len() >= self.config.max_positions {
            return no_fill(state, NoFillReason::MaxPositions, action, bar);
        }

        let protection = Protection {
            stop_loss: terms.resolve_stop_loss(side, fill_price),
            take_profit: terms.resolve_take_profit(side, fill_price),
            trailing_stop: terms.trailing_stop,
        };
        state.open_position(side, fill_price, terms.quantity, bar.timestamp, protection);
    }
}

fn no_fill(state: &mut EngineState, reason: NoFillReason, action: &str, bar: &Bar) {
    tracing::debug!(action, ?reason, timestamp = bar.timestamp, "order not filled");
    state.record_no_fill(reason);
}

/// Run one replay with a throwaway engine.
pub fn run_backtest(
    strategy: &mut dyn Strategy,
    bars: &[Bar],
    config: &EngineConfig,
) -> Result<RunResult, EngineError> {
    Engine::new(config.clone()).run(strategy, bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{Decision, StrategyError};

    /// Replays a fixed decision per bar.
    struct Scripted {
        script: Vec<Decision>,
        cursor: usize,
    }

    impl Scripted {
        fn new(script: Vec<Decision>) -> Self {
            Self { script, cursor: 0 }
        }
    }

    impl Strategy for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn on_bar(&mut self, _bar: &Bar) -> Decision {
            let decision = self.script.get(self.cursor).cloned().unwrap_or_default();
            self.cursor += 1;
            decision
        }
    }

    struct FailsInit;

    impl Strategy for FailsInit {
        fn name(&self) -> &str {
            "fails"
        }

        fn initialize(&mut self) -> Result<(), StrategyError> {
            Err(StrategyError::Initialization("model file missing".into()))
        }

        fn on_bar(&mut self, _bar: &Bar) -> Decision {
            Decision::Hold
        }
    }

    fn bar(ts: i64, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar::new(ts, open, high, low, close, 1.0)
    }

    fn engine() -> Engine {
        Engine::new(EngineConfig::new(10_000.0, 1))
    }

    #[test]
    fn empty_series_is_no_data() {
        let mut s = Scripted::new(vec![]);
        assert!(matches!(engine().run(&mut s, &[]), Err(EngineError::NoData)));
    }

    #[test]
    fn initialization_failure_aborts() {
        let bars = [bar(0, 1.0, 1.0, 1.0, 1.0)];
        let err = engine().run(&mut FailsInit, &bars).unwrap_err();
        assert!(matches!(err, EngineError::StrategyInstantiation(_)));
    }

    #[test]
    fn invalid_config_aborts() {
        let bars = [bar(0, 1.0, 1.0, 1.0, 1.0)];
        let mut s = Scripted::new(vec![]);
        let err = Engine::new(EngineConfig::new(10_000.0, 0))
            .run(&mut s, &bars)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn stop_loss_fills_at_stop_and_skips_take_profit() {
        // Bar 2 straddles both levels; the stop wins
        let bars = [
            bar(0, 100.0, 100.0, 100.0, 100.0),
            bar(1, 100.0, 106.0, 97.0, 101.0),
        ];
        let mut s = Scripted::new(vec![OrderRequest::buy(
            EntryTerms::market(10.0).stop_loss(98.0).take_profit(105.0),
        )
        .into()]);
        let result = engine().run(&mut s, &bars).unwrap();
        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.exit_price, 98.0);
        assert_eq!(trade.exit_reason, ExitReason::StopLoss);
        assert_eq!(trade.candles_held, 1);
        assert_eq!(result.final_capital, 9_980.0);
    }

    #[test]
    fn position_opened_on_bar_is_not_checked_until_next_bar() {
        // Entry bar's own range would trip the stop
        let bars = [bar(0, 100.0, 100.0, 90.0, 100.0), bar(1, 100.0, 100.0, 100.0, 100.0)];
        let mut s = Scripted::new(vec![OrderRequest::buy(
            EntryTerms::market(1.0).stop_loss(95.0),
        )
        .into()]);
        let result = engine().run(&mut s, &bars).unwrap();
        assert_eq!(result.trades[0].exit_reason, ExitReason::EndOfBacktest);
        assert_eq!(result.trades[0].candles_held, 1);
    }

    #[test]
    fn sell_closes_existing_long_before_shorting() {
        let bars = [
            bar(0, 100.0, 100.0, 100.0, 100.0),
            bar(1, 110.0, 110.0, 110.0, 110.0),
            bar(2, 105.0, 105.0, 105.0, 105.0),
        ];
        let mut s = Scripted::new(vec![
            OrderRequest::buy(EntryTerms::market(10.0)).into(),
            OrderRequest::sell(EntryTerms::market(10.0).exit_reason("TAKE_GAINS")).into(),
            OrderRequest::sell(EntryTerms::market(10.0)).into(),
        ]);
        let result = engine().run(&mut s, &bars).unwrap();
        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.trades[0].side, PositionSide::Long);
        assert_eq!(result.trades[0].exit_reason, ExitReason::from("TAKE_GAINS"));
        assert_eq!(result.trades[1].side, PositionSide::Short);
        assert_eq!(result.trades[1].exit_reason, ExitReason::EndOfBacktest);
        assert_eq!(result.final_capital, 10_100.0);
    }

    #[test]
    fn unmatched_close_is_counted_not_raised() {
        let bars = [bar(0, 1.0, 1.0, 1.0, 1.0)];
        let mut s = Scripted::new(vec![OrderRequest::close().into()]);
        let result = engine().run(&mut s, &bars).unwrap();
        assert!(result.trades.is_empty());
        assert_eq!(result.no_fills[&NoFillReason::NoMatchingPosition], 1);
        assert_eq!(result.equity_curve, vec![10_000.0, 10_000.0]);
    }

    #[test]
    fn invalid_quantity_is_dropped() {
        let bars = [bar(0, 10.0, 10.0, 10.0, 10.0)];
        let mut s = Scripted::new(vec![Decision::Batch(vec![
            OrderRequest::buy(EntryTerms::market(0.0)),
            OrderRequest::buy(EntryTerms::market(-1.0)),
            OrderRequest::buy(EntryTerms::market(f64::NAN)),
        ])]);
        let result = engine().run(&mut s, &bars).unwrap();
        assert!(result.trades.is_empty());
        assert_eq!(result.no_fills[&NoFillReason::InvalidQuantity], 3);
    }

    #[test]
    fn equity_marks_open_positions() {
        let bars = [
            bar(0, 100.0, 100.0, 100.0, 100.0),
            bar(1, 120.0, 120.0, 120.0, 120.0),
        ];
        let mut s = Scripted::new(vec![OrderRequest::buy(EntryTerms::market(10.0)).into()]);
        let result = engine().run(&mut s, &bars).unwrap();
        assert_eq!(result.equity_curve, vec![10_000.0, 9_000.0, 9_200.0]);
        assert_eq!(result.final_capital, 10_200.0);
    }
}
