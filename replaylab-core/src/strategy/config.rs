//! Configuration handed to a strategy at construction, plus risk-based sizing.

use super::StrategyError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

fn default_max_positions() -> usize {
    1
}

fn default_risk_per_trade() -> f64 {
    0.02
}

fn default_initial_capital() -> f64 {
    10_000.0
}

/// Common strategy settings and free-form parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    #[serde(default = "default_max_positions")]
    pub max_positions: usize,
    /// Fraction of initial capital risked per trade.
    #[serde(default = "default_risk_per_trade")]
    pub risk_per_trade: f64,
    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            max_positions: default_max_positions(),
            risk_per_trade: default_risk_per_trade(),
            initial_capital: default_initial_capital(),
            params: BTreeMap::new(),
        }
    }
}

impl StrategyConfig {
    pub fn new(initial_capital: f64, max_positions: usize) -> Self {
        Self {
            initial_capital,
            max_positions,
            ..Self::default()
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Quantity that loses `risk_amount` if price moves from entry to stop.
    ///
    /// `risk_amount` defaults to `initial_capital * risk_per_trade`. Returns
    /// 0 when entry and stop coincide.
    pub fn position_size(&self, entry_price: f64, stop_price: f64, risk_amount: Option<f64>) -> f64 {
        let risk = risk_amount.unwrap_or(self.initial_capital * self.risk_per_trade);
        let per_unit = (entry_price - stop_price).abs();
        if per_unit == 0.0 {
            return 0.0;
        }
        risk / per_unit
    }

    /// Numeric parameter, or `default` when absent.
    pub fn param_f64(&self, name: &str, default: f64) -> Result<f64, StrategyError> {
        match self.params.get(name) {
            None => Ok(default),
            Some(value) => value.as_f64().ok_or_else(|| StrategyError::InvalidParam {
                name: name.to_string(),
                reason: format!("expected a number, got {value}"),
            }),
        }
    }

    /// Positive integer parameter, or `default` when absent.
    pub fn param_period(&self, name: &str, default: usize) -> Result<usize, StrategyError> {
        match self.params.get(name) {
            None => Ok(default),
            Some(value) => value
                .as_u64()
                .filter(|&v| v >= 1)
                .map(|v| v as usize)
                .ok_or_else(|| StrategyError::InvalidParam {
                    name: name.to_string(),
                    reason: format!("expected a positive integer, got {value}"),
                }),
        }
    }
}
