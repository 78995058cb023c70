//! Bar: the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar for one fixed interval.
///
/// `timestamp` is the bar's open time in Unix milliseconds. The engine assumes
/// `low <= open, close <= high` but does not enforce it; garbage-in is a
/// data-source concern. [`Bar::is_sane`] is available for sources that want to
/// validate before handing bars over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Returns true if any OHLC field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLCV sanity check: positive prices, non-negative volume, and the
    /// high/low envelope containing open and close.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.open > 0.0
            && self.close > 0.0
            && self.low > 0.0
            && self.volume >= 0.0
            && self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }

    /// Whether `price` lies within the bar's traded range (inclusive).
    pub fn contains_price(&self, price: f64) -> bool {
        self.low <= price && price <= self.high
    }

    /// Bar open time as a UTC datetime. `None` if the timestamp is out of range.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}
