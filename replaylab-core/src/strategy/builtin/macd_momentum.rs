use super::{fraction_param, ordered_periods, sized_quantity, PriceHistory};
use crate::domain::{Bar, EntryTerms, OrderRequest};
use crate::indicators::{last_pair, Macd};
use crate::strategy::{Decision, Strategy, StrategyConfig, StrategyContext, StrategyError};

/// MACD signal-line crossover with a trailing stop.
///
/// Buys when the MACD line crosses above its signal line and closes on the
/// opposite cross. Entries carry a percent stop, target and trailing stop.
///
/// Params: `fast_period` (12), `slow_period` (26), `signal_period` (9),
/// `stop_loss_pct` (0.05), `take_profit_pct` (0.10), `trailing_stop` (0.03),
/// `max_allocation` (0.95).
pub struct MacdMomentum {
    config: StrategyConfig,
    macd: Macd,
    slow_period: usize,
    stop_loss_pct: f64,
    take_profit_pct: f64,
    trailing_stop: f64,
    max_allocation: f64,
    history: PriceHistory,
    long: bool,
}

impl MacdMomentum {
    pub const CLASS_NAME: &'static str = "MACDMomentumStrategy";
    const HISTORY: usize = 200;

    pub fn new(config: StrategyConfig) -> Result<Self, StrategyError> {
        let (fast, slow) = ordered_periods(&config, "fast_period", 12, "slow_period", 26)?;
        let signal = config.param_period("signal_period", 9)?;
        let macd = Macd::new(fast, slow, signal);
        Ok(Self {
            history: PriceHistory::new(Self::HISTORY.max(macd.signal_lookback() + 2)),
            macd,
            slow_period: slow,
            stop_loss_pct: fraction_param(&config, "stop_loss_pct", 0.05)?,
            take_profit_pct: config.param_f64("take_profit_pct", 0.10)?,
            trailing_stop: fraction_param(&config, "trailing_stop", 0.03)?,
            max_allocation: fraction_param(&config, "max_allocation", 0.95)?,
            long: false,
            config,
        })
    }

    pub fn factory(ctx: StrategyContext) -> Result<Box<dyn Strategy>, StrategyError> {
        Ok(Box::new(Self::new(ctx.config)?))
    }
}

impl Strategy for MacdMomentum {
    fn name(&self) -> &str {
        Self::CLASS_NAME
    }

    fn on_bar(&mut self, bar: &Bar) -> Decision {
        self.history.push(bar.close);
        if self.history.len() < self.slow_period {
            return Decision::Hold;
        }
        let lines = self.macd.compute_lines(self.history.as_slice());
        let (Some((prev_macd, macd)), Some((prev_signal, signal))) =
            (last_pair(&lines.macd), last_pair(&lines.signal))
        else {
            return Decision::Hold;
        };

        if !self.long {
            if prev_macd <= prev_signal && macd > signal {
                self.long = true;
                let stop = bar.close * (1.0 - self.stop_loss_pct);
                let quantity = sized_quantity(&self.config, bar.close, stop, self.max_allocation);
                return OrderRequest::buy(
                    EntryTerms::market(quantity)
                        .stop_loss_pct(self.stop_loss_pct)
                        .take_profit_pct(self.take_profit_pct)
                        .trailing_stop(self.trailing_stop)
                        .exit_reason("MACD_BULLISH_CROSSOVER"),
                )
                .into();
            }
        } else if prev_macd >= prev_signal && macd < signal {
            self.long = false;
            return OrderRequest::close_all_because("MACD_BEARISH_CROSSOVER").into();
        }

        Decision::Hold
    }
}
