//! Technical indicators used by the built-in strategies.
//!
//! Indicators are pure functions over a close-price series: values in, a
//! series of the same length out, with `f64::NAN` for every index that lacks
//! enough history. No value at index t depends on input after t.

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use ema::Ema;
pub use macd::{Macd, MacdLines};
pub use rsi::Rsi;
pub use sma::Sma;

/// A single-series indicator.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "rsi_14").
    fn name(&self) -> &str;

    /// Index of the first valid output value.
    fn lookback(&self) -> usize;

    /// Compute over the whole series. The first `lookback()` values are NaN.
    fn compute(&self, values: &[f64]) -> Vec<f64>;
}

/// Last value of a series, if it is defined.
pub fn last_defined(series: &[f64]) -> Option<f64> {
    series.last().copied().filter(|v| !v.is_nan())
}

/// Last two values of a series as `(previous, current)`, if both are defined.
pub fn last_pair(series: &[f64]) -> Option<(f64, f64)> {
    match series {
        [.., prev, curr] if !prev.is_nan() && !curr.is_nan() => Some((*prev, *curr)),
        _ => None,
    }
}

#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}
