use super::{fraction_param, ordered_periods, sized_quantity, PriceHistory};
use crate::domain::{Bar, EntryTerms, OrderRequest};
use crate::indicators::Sma;
use crate::strategy::{Decision, Strategy, StrategyConfig, StrategyContext, StrategyError};

/// Long-only SMA trend follower.
///
/// Enters long while the fast SMA is above the slow SMA and no entry is
/// outstanding; closes everything once the fast SMA drops below the slow one.
///
/// Params: `fast_period` (10), `slow_period` (20), `stop_loss_pct` (0.02),
/// `take_profit_pct` (0.05), `max_allocation` (0.95).
pub struct MaCrossover {
    config: StrategyConfig,
    fast: Sma,
    slow: Sma,
    slow_period: usize,
    stop_loss_pct: f64,
    take_profit_pct: f64,
    max_allocation: f64,
    history: PriceHistory,
    long: bool,
}

impl MaCrossover {
    pub const CLASS_NAME: &'static str = "MACrossoverStrategy";
    const HISTORY: usize = 100;

    pub fn new(config: StrategyConfig) -> Result<Self, StrategyError> {
        let (fast_period, slow_period) =
            ordered_periods(&config, "fast_period", 10, "slow_period", 20)?;
        Ok(Self {
            fast: Sma::new(fast_period),
            slow: Sma::new(slow_period),
            slow_period,
            stop_loss_pct: fraction_param(&config, "stop_loss_pct", 0.02)?,
            take_profit_pct: config.param_f64("take_profit_pct", 0.05)?,
            max_allocation: fraction_param(&config, "max_allocation", 0.95)?,
            history: PriceHistory::new(Self::HISTORY.max(slow_period)),
            long: false,
            config,
        })
    }

    pub fn factory(ctx: StrategyContext) -> Result<Box<dyn Strategy>, StrategyError> {
        Ok(Box::new(Self::new(ctx.config)?))
    }
}

impl Strategy for MaCrossover {
    fn name(&self) -> &str {
        Self::CLASS_NAME
    }

    fn on_bar(&mut self, bar: &Bar) -> Decision {
        self.history.push(bar.close);
        if self.history.len() < self.slow_period {
            return Decision::Hold;
        }
        let closes = self.history.as_slice();
        let (Some(fast), Some(slow)) = (self.fast.latest(closes), self.slow.latest(closes)) else {
            return Decision::Hold;
        };

        if !self.long && fast > slow {
            self.long = true;
            let stop = bar.close * (1.0 - self.stop_loss_pct);
            let quantity = sized_quantity(&self.config, bar.close, stop, self.max_allocation);
            return OrderRequest::buy(
                EntryTerms::market(quantity)
                    .stop_loss_pct(self.stop_loss_pct)
                    .take_profit_pct(self.take_profit_pct)
                    .exit_reason("MA_CROSSOVER_ENTRY"),
            )
            .into();
        }

        if self.long && fast < slow {
            self.long = false;
            return OrderRequest::close_all_because("MA_CROSSOVER_EXIT").into();
        }

        Decision::Hold
    }
}
