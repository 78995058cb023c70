//! Simple Moving Average (SMA).
//!
//! Rolling mean over a lookback window.
//! Lookback: period - 1 (first valid value at index period-1).

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }

    /// Mean of the trailing `period` values, if there are that many.
    pub fn latest(&self, values: &[f64]) -> Option<f64> {
        if values.len() < self.period {
            return None;
        }
        let window = &values[values.len() - self.period..];
        Some(window.iter().sum::<f64>() / self.period as f64)
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, values: &[f64]) -> Vec<f64> {
        let mut result = vec![f64::NAN; values.len()];
        for (i, window) in values.windows(self.period).enumerate() {
            result[i + self.period - 1] = window.iter().sum::<f64>() / self.period as f64;
        }
        result
    }
}
