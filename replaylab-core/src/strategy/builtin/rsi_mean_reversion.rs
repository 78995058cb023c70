use super::{fraction_param, sized_quantity, PriceHistory};
use crate::domain::{Bar, EntryTerms, OrderRequest, PositionSide};
use crate::indicators::{last_defined, Indicator, Rsi};
use crate::strategy::{Decision, Strategy, StrategyConfig, StrategyContext, StrategyError};

/// Two-sided RSI mean reversion.
///
/// Oversold (RSI < 30) buys, overbought (RSI > 70) sells short, and a return
/// to the neutral band [40, 60] closes everything.
///
/// Params: `rsi_period` (14), `oversold` (30), `overbought` (70),
/// `neutral_low` (40), `neutral_high` (60), `stop_loss_pct` (0.03),
/// `take_profit_pct` (0.06), `max_allocation` (0.95).
pub struct RsiMeanReversion {
    config: StrategyConfig,
    rsi: Rsi,
    period: usize,
    oversold: f64,
    overbought: f64,
    neutral: (f64, f64),
    stop_loss_pct: f64,
    take_profit_pct: f64,
    max_allocation: f64,
    history: PriceHistory,
}

impl RsiMeanReversion {
    pub const CLASS_NAME: &'static str = "RSIMeanReversionStrategy";
    const HISTORY: usize = 200;

    pub fn new(config: StrategyConfig) -> Result<Self, StrategyError> {
        let period = config.param_period("rsi_period", 14)?;
        let oversold = config.param_f64("oversold", 30.0)?;
        let overbought = config.param_f64("overbought", 70.0)?;
        let neutral = (
            config.param_f64("neutral_low", 40.0)?,
            config.param_f64("neutral_high", 60.0)?,
        );
        if !(oversold < neutral.0 && neutral.0 <= neutral.1 && neutral.1 < overbought) {
            return Err(StrategyError::InvalidParam {
                name: "oversold".into(),
                reason: format!(
                    "thresholds must satisfy oversold < neutral_low <= neutral_high < overbought, \
                     got {oversold} / {} / {} / {overbought}",
                    neutral.0, neutral.1
                ),
            });
        }
        Ok(Self {
            rsi: Rsi::new(period),
            period,
            oversold,
            overbought,
            neutral,
            stop_loss_pct: fraction_param(&config, "stop_loss_pct", 0.03)?,
            take_profit_pct: config.param_f64("take_profit_pct", 0.06)?,
            max_allocation: fraction_param(&config, "max_allocation", 0.95)?,
            history: PriceHistory::new(Self::HISTORY.max(period + 1)),
            config,
        })
    }

    pub fn factory(ctx: StrategyContext) -> Result<Box<dyn Strategy>, StrategyError> {
        Ok(Box::new(Self::new(ctx.config)?))
    }

    fn entry(&self, close: f64, stop: f64) -> EntryTerms {
        EntryTerms::market(sized_quantity(&self.config, close, stop, self.max_allocation))
            .stop_loss_pct(self.stop_loss_pct)
            .take_profit_pct(self.take_profit_pct)
    }
}

impl Strategy for RsiMeanReversion {
    fn name(&self) -> &str {
        Self::CLASS_NAME
    }

    fn on_bar(&mut self, bar: &Bar) -> Decision {
        self.history.push(bar.close);
        if self.history.len() < self.period + 1 {
            return Decision::Hold;
        }
        let Some(rsi) = last_defined(&self.rsi.compute(self.history.as_slice())) else {
            return Decision::Hold;
        };

        if rsi < self.oversold {
            let stop = bar.close * (1.0 - self.stop_loss_pct);
            OrderRequest::buy(self.entry(bar.close, stop).exit_reason("RSI_OVERSOLD_ENTRY")).into()
        } else if rsi > self.overbought {
            let stop = bar.close * (1.0 + self.stop_loss_pct);
            OrderRequest::sell(
                self.entry(bar.close, stop)
                    .position_side(PositionSide::Short)
                    .exit_reason("RSI_OVERBOUGHT_ENTRY"),
            )
            .into()
        } else if rsi >= self.neutral.0 && rsi <= self.neutral.1 {
            OrderRequest::close_all_because("RSI_NEUTRAL_EXIT").into()
        } else {
            Decision::Hold
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(close: f64) -> Bar {
        Bar::new(0, close, close + 0.5, close - 0.5, close, 1.0)
    }

    fn feed(s: &mut RsiMeanReversion, closes: impl IntoIterator<Item = f64>) -> Decision {
        let mut last = Decision::Hold;
        for close in closes {
            last = s.on_bar(&bar(close));
        }
        last
    }

    fn strategy() -> RsiMeanReversion {
        RsiMeanReversion::new(StrategyConfig::new(10_000.0, 1).with_param("rsi_period", 5)).unwrap()
    }

    #[test]
    fn oversold_buys() {
        let mut s = strategy();
        let decision = feed(&mut s, (0..10).map(|i| 100.0 - i as f64));
        let orders = decision.into_orders();
        let [OrderRequest::Buy(terms)] = orders.as_slice() else {
            panic!("expected single BUY, got {orders:?}");
        };
        assert_eq!(terms.stop_loss_pct, Some(0.03));
        assert_eq!(terms.take_profit_pct, Some(0.06));
        assert!(terms.quantity > 0.0);
    }

    #[test]
    fn overbought_sells_short() {
        let mut s = strategy();
        let decision = feed(&mut s, (0..10).map(|i| 100.0 + i as f64));
        let orders = decision.into_orders();
        let [OrderRequest::Sell(terms)] = orders.as_slice() else {
            panic!("expected single SELL, got {orders:?}");
        };
        assert_eq!(terms.position_side, Some(PositionSide::Short));
    }

    #[test]
    fn neutral_closes_all() {
        let mut s = strategy();
        let decision = feed(&mut s, [100.0, 101.0, 100.0, 101.0, 100.0, 101.0, 100.0]);
        assert_eq!(
            decision.into_orders(),
            vec![OrderRequest::close_all_because("RSI_NEUTRAL_EXIT")]
        );
    }

    #[test]
    fn inverted_thresholds_rejected() {
        let config = StrategyConfig::default().with_param("oversold", 80.0);
        assert!(RsiMeanReversion::new(config).is_err());
    }
}
