//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (period + 1)
//! Seed: EMA[period-1] = SMA of the first `period` values.
//! Lookback: period - 1.

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }

    pub fn alpha(&self) -> f64 {
        2.0 / (self.period as f64 + 1.0)
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, values: &[f64]) -> Vec<f64> {
        let n = values.len();
        let mut result = vec![f64::NAN; n];
        if n < self.period {
            return result;
        }

        let seed = values[..self.period].iter().sum::<f64>() / self.period as f64;
        result[self.period - 1] = seed;

        let alpha = self.alpha();
        let mut prev = seed;
        for i in self.period..n {
            prev = alpha * values[i] + (1.0 - alpha) * prev;
            result[i] = prev;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn ema_seed_is_sma() {
        let out = Ema::new(3).compute(&[2.0, 4.0, 6.0, 8.0]);
        assert!(out[1].is_nan());
        assert_approx(out[2], 4.0, 1e-12);
        // alpha = 0.5: 0.5 * 8 + 0.5 * 4
        assert_approx(out[3], 6.0, 1e-12);
    }

    #[test]
    fn constant_series_is_flat() {
        let out = Ema::new(5).compute(&[7.0; 20]);
        assert!(out[4..].iter().all(|v| (v - 7.0).abs() < 1e-12));
    }
}
