//! Relative Strength Index (RSI).
//!
//! Uses Wilder smoothing of average gains and average losses.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period.
//! Edge cases: avg_loss == 0 → RSI = 100 (50 if avg_gain is also 0); avg_gain == 0 → RSI = 0.

use super::Indicator;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, values: &[f64]) -> Vec<f64> {
        let n = values.len();
        let mut result = vec![f64::NAN; n];
        if n < self.period + 1 {
            return result;
        }

        let changes: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();

        // Seed over the first `period` changes
        let mut avg_gain = 0.0;
        let mut avg_loss = 0.0;
        for &ch in &changes[..self.period] {
            if ch > 0.0 {
                avg_gain += ch;
            } else {
                avg_loss -= ch;
            }
        }
        avg_gain /= self.period as f64;
        avg_loss /= self.period as f64;
        result[self.period] = rsi_from_averages(avg_gain, avg_loss);

        let alpha = 1.0 / self.period as f64;
        for i in (self.period + 1)..n {
            let ch = changes[i - 1];
            let (gain, loss) = if ch > 0.0 { (ch, 0.0) } else { (0.0, -ch) };
            avg_gain = avg_gain * (1.0 - alpha) + gain * alpha;
            avg_loss = avg_loss * (1.0 - alpha) + loss * alpha;
            result[i] = rsi_from_averages(avg_gain, avg_loss);
        }
        result
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            50.0
        } else {
            100.0
        }
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn rising_series_is_100() {
        let values: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let out = Rsi::new(14).compute(&values);
        assert!(out[13].is_nan());
        assert_approx(out[14], 100.0, 1e-12);
        assert_approx(out[19], 100.0, 1e-12);
    }

    #[test]
    fn falling_series_is_0() {
        let values: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let out = Rsi::new(14).compute(&values);
        assert_approx(out[19], 0.0, 1e-12);
    }

    #[test]
    fn flat_series_is_neutral() {
        let out = Rsi::new(3).compute(&[5.0; 10]);
        assert_approx(out[9], 50.0, 1e-12);
    }

    #[test]
    fn balanced_moves_sit_at_50() {
        // +1, -1, +1, -1 → avg gain == avg loss on the seed
        let out = Rsi::new(4).compute(&[10.0, 11.0, 10.0, 11.0, 10.0]);
        assert_approx(out[4], 50.0, 1e-12);
    }

    #[test]
    fn values_stay_in_range() {
        let values: Vec<f64> = (0..100).map(|i| 50.0 + (i as f64).sin() * 10.0).collect();
        let out = Rsi::new(14).compute(&values);
        assert!(out[14..].iter().all(|v| (0.0..=100.0).contains(v)));
    }
}
