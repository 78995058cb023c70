//! Bundled example strategies.
//!
//! Each keeps its own bounded close-price history and recomputes indicators
//! over it on every bar. Parameters come from `StrategyConfig::params` with
//! the defaults documented on each strategy.

mod ma_crossover;
mod macd_momentum;
mod rsi_mean_reversion;

pub use ma_crossover::MaCrossover;
pub use macd_momentum::MacdMomentum;
pub use rsi_mean_reversion::RsiMeanReversion;

use super::{StrategyConfig, StrategyError};

/// Close prices, oldest first, capped at `capacity`.
#[derive(Debug, Clone)]
pub(crate) struct PriceHistory {
    values: Vec<f64>,
    capacity: usize,
}

impl PriceHistory {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub(crate) fn push(&mut self, close: f64) {
        self.values.push(close);
        if self.values.len() > self.capacity {
            self.values.remove(0);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

/// Parameter in (0, 1].
pub(crate) fn fraction_param(
    config: &StrategyConfig,
    name: &str,
    default: f64,
) -> Result<f64, StrategyError> {
    let value = config.param_f64(name, default)?;
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(StrategyError::InvalidParam {
            name: name.to_string(),
            reason: format!("must be in (0, 1], got {value}"),
        })
    }
}

pub(crate) fn ordered_periods(
    config: &StrategyConfig,
    fast_name: &str,
    fast_default: usize,
    slow_name: &str,
    slow_default: usize,
) -> Result<(usize, usize), StrategyError> {
    let fast = config.param_period(fast_name, fast_default)?;
    let slow = config.param_period(slow_name, slow_default)?;
    if fast >= slow {
        return Err(StrategyError::InvalidParam {
            name: fast_name.to_string(),
            reason: format!("must be below {slow_name} ({fast} >= {slow})"),
        });
    }
    Ok((fast, slow))
}

/// Risk-sized quantity, capped so the entry cost stays within
/// `max_allocation` of initial capital.
pub(crate) fn sized_quantity(
    config: &StrategyConfig,
    entry_price: f64,
    stop_price: f64,
    max_allocation: f64,
) -> f64 {
    let risk_sized = config.position_size(entry_price, stop_price, None);
    if entry_price <= 0.0 {
        return risk_sized;
    }
    risk_sized.min(config.initial_capital * max_allocation / entry_price)
}
