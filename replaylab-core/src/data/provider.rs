//! Broker trait, bar requests, intervals, and structured data errors.
//!
//! The `Broker` trait abstracts over market-data sources (exchange REST API,
//! CSV files, in-memory bars, synthetic generator) so the engine and strategies
//! never know where bars come from. It doubles as the data handle given to
//! strategies, which is why it also carries order placement.

use crate::domain::{Bar, OrderRequest};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Structured error types for data operations.
///
/// `Http` and `Network` are the upstream faults callers need to tell apart
/// from local problems; neither is retried anywhere in the engine.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("upstream HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("response format changed: {0}")]
    ResponseFormat(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl DataError {
    /// True for faults that originate upstream of this process.
    pub fn is_upstream(&self) -> bool {
        matches!(self, DataError::Http { .. } | DataError::Network(_))
    }
}

/// Bar interval, named the way exchanges name them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    Minute1,
    #[serde(rename = "3m")]
    Minute3,
    #[serde(rename = "5m")]
    Minute5,
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "30m")]
    Minute30,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "2h")]
    Hour2,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "6h")]
    Hour6,
    #[serde(rename = "8h")]
    Hour8,
    #[serde(rename = "12h")]
    Hour12,
    #[serde(rename = "1d")]
    Day1,
    #[serde(rename = "3d")]
    Day3,
    #[serde(rename = "1w")]
    Week1,
    #[serde(rename = "1M")]
    Month1,
}

impl Interval {
    pub const ALL: [Interval; 15] = [
        Interval::Minute1,
        Interval::Minute3,
        Interval::Minute5,
        Interval::Minute15,
        Interval::Minute30,
        Interval::Hour1,
        Interval::Hour2,
        Interval::Hour4,
        Interval::Hour6,
        Interval::Hour8,
        Interval::Hour12,
        Interval::Day1,
        Interval::Day3,
        Interval::Week1,
        Interval::Month1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Minute1 => "1m",
            Interval::Minute3 => "3m",
            Interval::Minute5 => "5m",
            Interval::Minute15 => "15m",
            Interval::Minute30 => "30m",
            Interval::Hour1 => "1h",
            Interval::Hour2 => "2h",
            Interval::Hour4 => "4h",
            Interval::Hour6 => "6h",
            Interval::Hour8 => "8h",
            Interval::Hour12 => "12h",
            Interval::Day1 => "1d",
            Interval::Day3 => "3d",
            Interval::Week1 => "1w",
            Interval::Month1 => "1M",
        }
    }

    /// Nominal bar length in milliseconds. Months count as 30 days.
    pub fn duration_ms(&self) -> i64 {
        const MIN: i64 = 60_000;
        const HOUR: i64 = 60 * MIN;
        const DAY: i64 = 24 * HOUR;
        match self {
            Interval::Minute1 => MIN,
            Interval::Minute3 => 3 * MIN,
            Interval::Minute5 => 5 * MIN,
            Interval::Minute15 => 15 * MIN,
            Interval::Minute30 => 30 * MIN,
            Interval::Hour1 => HOUR,
            Interval::Hour2 => 2 * HOUR,
            Interval::Hour4 => 4 * HOUR,
            Interval::Hour6 => 6 * HOUR,
            Interval::Hour8 => 8 * HOUR,
            Interval::Hour12 => 12 * HOUR,
            Interval::Day1 => DAY,
            Interval::Day3 => 3 * DAY,
            Interval::Week1 => 7 * DAY,
            Interval::Month1 => 30 * DAY,
        }
    }

    /// Lenient parse: exact tag, then lower-cased tag, then `1h`.
    ///
    /// `1M` (month) and `1m` (minute) differ only by case, so the exact match
    /// has to come first.
    pub fn normalize(raw: &str) -> Interval {
        if let Ok(interval) = raw.parse() {
            return interval;
        }
        if let Ok(interval) = raw.to_lowercase().parse() {
            return interval;
        }
        tracing::warn!(interval = raw, "unrecognized interval, falling back to 1h");
        Interval::Hour1
    }
}

impl FromStr for Interval {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Interval::ALL
            .iter()
            .copied()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| DataError::InvalidRequest(format!("unknown interval '{s}'")))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to fetch: symbol, interval and an optional time window in Unix ms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarRequest {
    pub symbol: String,
    pub interval: Interval,
    pub limit: Option<usize>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
}

impl BarRequest {
    pub fn new(symbol: impl Into<String>, interval: Interval) -> Self {
        Self {
            symbol: symbol.into(),
            interval,
            limit: None,
            start_time: None,
            end_time: None,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn start_time(mut self, ms: i64) -> Self {
        self.start_time = Some(ms);
        self
    }

    pub fn end_time(mut self, ms: i64) -> Self {
        self.end_time = Some(ms);
        self
    }

    /// Apply the time window and limit to an already time-ordered series.
    ///
    /// Mirrors exchange semantics: with a start time the limit keeps the
    /// earliest bars, without one it keeps the most recent.
    pub fn apply_window(&self, bars: Vec<Bar>) -> Vec<Bar> {
        let mut windowed: Vec<Bar> = bars
            .into_iter()
            .filter(|b| self.start_time.map_or(true, |s| b.timestamp >= s))
            .filter(|b| self.end_time.map_or(true, |e| b.timestamp <= e))
            .collect();

        if let Some(limit) = self.limit {
            if windowed.len() > limit {
                if self.start_time.is_some() {
                    windowed.truncate(limit);
                } else {
                    windowed.drain(..windowed.len() - limit);
                }
            }
        }
        windowed
    }
}

/// Acknowledgement for a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: String,
    pub status: String,
}

/// Broker-like data handle: a market-data source that may also route orders.
pub trait Broker: Send + Sync {
    /// Human-readable name of this broker.
    fn name(&self) -> &str;

    /// Fetch a time-ordered bar series.
    fn fetch(&self, request: &BarRequest) -> Result<Vec<Bar>, DataError>;

    /// Route an order. Replay brokers refuse immediately.
    fn place_order(&self, symbol: &str, order: &OrderRequest) -> Result<OrderAck, DataError> {
        Err(DataError::UnsupportedOperation(format!(
            "{} cannot place {} orders for {symbol} in replay mode",
            self.name(),
            order.action()
        )))
    }
}

/// Check that bars are non-decreasing in timestamp.
pub fn ensure_time_ordered(bars: &[Bar]) -> Result<(), DataError> {
    match bars.windows(2).position(|w| w[1].timestamp < w[0].timestamp) {
        Some(i) => Err(DataError::ResponseFormat(format!(
            "bars out of order at index {}: {} < {}",
            i + 1,
            bars[i + 1].timestamp,
            bars[i].timestamp
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars(n: i64) -> Vec<Bar> {
        (0..n)
            .map(|i| Bar::new(i * 1000, 10.0, 11.0, 9.0, 10.0, 1.0))
            .collect()
    }

    #[test]
    fn interval_normalize_exact_and_lowercase() {
        assert_eq!(Interval::normalize("1M"), Interval::Month1);
        assert_eq!(Interval::normalize("1m"), Interval::Minute1);
        assert_eq!(Interval::normalize("4H"), Interval::Hour4);
        assert_eq!(Interval::normalize("1D"), Interval::Day1);
    }

    #[test]
    fn interval_normalize_falls_back_to_hourly() {
        assert_eq!(Interval::normalize("fortnight"), Interval::Hour1);
    }

    #[test]
    fn interval_strict_parse_rejects_unknown() {
        assert!("7m".parse::<Interval>().is_err());
        assert_eq!("15m".parse::<Interval>().unwrap(), Interval::Minute15);
    }

    #[test]
    fn interval_serde_uses_exchange_tags() {
        assert_eq!(serde_json::to_string(&Interval::Week1).unwrap(), r#""1w""#);
        let parsed: Interval = serde_json::from_str(r#""1M""#).unwrap();
        assert_eq!(parsed, Interval::Month1);
    }

    #[test]
    fn window_without_start_keeps_most_recent() {
        let req = BarRequest::new("X", Interval::Minute1).limit(3);
        let out = req.apply_window(bars(10));
        let ts: Vec<i64> = out.iter().map(|b| b.timestamp).collect();
        assert_eq!(ts, vec![7000, 8000, 9000]);
    }

    #[test]
    fn window_with_start_keeps_earliest() {
        let req = BarRequest::new("X", Interval::Minute1)
            .start_time(2000)
            .end_time(8000)
            .limit(2);
        let out = req.apply_window(bars(10));
        let ts: Vec<i64> = out.iter().map(|b| b.timestamp).collect();
        assert_eq!(ts, vec![2000, 3000]);
    }

    #[test]
    fn ordering_check() {
        assert!(ensure_time_ordered(&bars(5)).is_ok());
        let mut shuffled = bars(5);
        shuffled.swap(1, 3);
        assert!(matches!(
            ensure_time_ordered(&shuffled),
            Err(DataError::ResponseFormat(_))
        ));
    }

    #[test]
    fn upstream_classification() {
        assert!(DataError::Network("x".into()).is_upstream());
        assert!(DataError::Http {
            status: 500,
            body: String::new()
        }
        .is_upstream());
        assert!(!DataError::InvalidRequest("x".into()).is_upstream());
    }
}
