//! Moving Average Convergence Divergence (MACD).
//!
//! macd = EMA(fast) - EMA(slow)
//! signal = EMA(signal) of the macd line, seeded from its first defined value
//! histogram = macd - signal
//!
//! As an `Indicator` the output is the macd line (lookback slow - 1).

use super::{Ema, Indicator};

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    name: String,
}

/// All three MACD series, index-aligned with the input.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdLines {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(fast < slow, "MACD fast period must be below slow period");
        Self {
            fast,
            slow,
            signal,
            name: format!("macd_{fast}_{slow}_{signal}"),
        }
    }

    /// Index of the first defined signal value.
    pub fn signal_lookback(&self) -> usize {
        self.slow - 1 + self.signal - 1
    }

    pub fn compute_lines(&self, values: &[f64]) -> MacdLines {
        let n = values.len();
        let fast = Ema::new(self.fast).compute(values);
        let slow = Ema::new(self.slow).compute(values);
        let macd: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();

        let mut signal = vec![f64::NAN; n];
        let start = self.slow - 1;
        if n > start {
            let tail = Ema::new(self.signal).compute(&macd[start..]);
            signal[start..].copy_from_slice(&tail);
        }

        let histogram = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();
        MacdLines {
            macd,
            signal,
            histogram,
        }
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.slow - 1
    }

    fn compute(&self, values: &[f64]) -> Vec<f64> {
        self.compute_lines(values).macd
    }
}
