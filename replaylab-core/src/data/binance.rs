//! Binance spot market-data source.
//!
//! Fetches klines from the public `GET /api/v3/klines` endpoint. No
//! authentication, no retries: transport failures and non-2xx statuses
//! propagate to the caller as `DataError::Network` / `DataError::Http`.

use super::provider::{BarRequest, Broker, DataError};
use crate::domain::Bar;
use serde_json::Value;
use std::time::Duration;

pub const BINANCE_BASE_URL: &str = "https://api.binance.com/api/v3";

/// Binance spot klines client.
pub struct BinanceSource {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl BinanceSource {
    pub const DEFAULT_LIMIT: usize = 500;
    pub const MAX_LIMIT: usize = 1000;
    const TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new() -> Result<Self, DataError> {
        Self::with_base_url(BINANCE_BASE_URL)
    }

    /// Point at a different REST root (testnet, local mock).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Self::TIMEOUT)
            .build()
            .map_err(|e| DataError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Absent limit means 500; anything above 1000 is clamped.
    pub fn clamp_limit(limit: Option<usize>) -> usize {
        limit.unwrap_or(Self::DEFAULT_LIMIT).min(Self::MAX_LIMIT)
    }

    fn query(request: &BarRequest) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("symbol", request.symbol.to_uppercase()),
            ("interval", request.interval.as_str().to_string()),
            ("limit", Self::clamp_limit(request.limit).to_string()),
        ];
        if let Some(start) = request.start_time {
            params.push(("startTime", start.to_string()));
        }
        if let Some(end) = request.end_time {
            params.push(("endTime", end.to_string()));
        }
        params
    }

    /// Parse the kline array payload.
    ///
    /// Each row is `[open_time, open, high, low, close, volume, ...]` with the
    /// price and volume fields encoded as decimal strings.
    pub fn parse_klines(rows: &[Vec<Value>]) -> Result<Vec<Bar>, DataError> {
        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                if row.len() < 6 {
                    return Err(DataError::ResponseFormat(format!(
                        "kline {i} has {} fields, expected at least 6",
                        row.len()
                    )));
                }
                let timestamp = row[0].as_i64().ok_or_else(|| {
                    DataError::ResponseFormat(format!("kline {i}: open time is not an integer"))
                })?;
                Ok(Bar::new(
                    timestamp,
                    decimal_field(&row[1], i, "open")?,
                    decimal_field(&row[2], i, "high")?,
                    decimal_field(&row[3], i, "low")?,
                    decimal_field(&row[4], i, "close")?,
                    decimal_field(&row[5], i, "volume")?,
                ))
            })
            .collect()
    }
}

fn decimal_field(value: &Value, row: usize, field: &str) -> Result<f64, DataError> {
    let parsed = match value {
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed.ok_or_else(|| DataError::ResponseFormat(format!("kline {row}: bad {field} {value}")))
}

impl Broker for BinanceSource {
    fn name(&self) -> &str {
        "binance"
    }

    fn fetch(&self, request: &BarRequest) -> Result<Vec<Bar>, DataError> {
        let url = format!("{}/klines", self.base_url);
        tracing::info!(
            symbol = %request.symbol,
            interval = %request.interval,
            limit = Self::clamp_limit(request.limit),
            "fetching klines"
        );

        let resp = self
            .client
            .get(&url)
            .query(&Self::query(request))
            .send()
            .map_err(|e| DataError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(DataError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let rows: Vec<Vec<Value>> = resp.json().map_err(|e| {
            DataError::ResponseFormat(format!(
                "failed to parse klines for {}: {e}",
                request.symbol
            ))
        })?;

        let bars = Self::parse_klines(&rows)?;
        tracing::debug!(count = bars.len(), "klines received");
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Interval;
    use crate::domain::OrderRequest;
    use serde_json::json;

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(BinanceSource::clamp_limit(None), 500);
        assert_eq!(BinanceSource::clamp_limit(Some(42)), 42);
        assert_eq!(BinanceSource::clamp_limit(Some(5000)), 1000);
    }

    #[test]
    fn query_includes_optional_window() {
        let req = BarRequest::new("btcusdt", Interval::Hour4)
            .start_time(1_000)
            .end_time(2_000);
        let q = BinanceSource::query(&req);
        assert!(q.contains(&("symbol", "BTCUSDT".to_string())));
        assert!(q.contains(&("interval", "4h".to_string())));
        assert!(q.contains(&("limit", "500".to_string())));
        assert!(q.contains(&("startTime", "1000".to_string())));
        assert!(q.contains(&("endTime", "2000".to_string())));
    }

    #[test]
    fn parses_string_encoded_klines() {
        let payload = json!([
            [1_706_284_800_000_i64, "43250.50", "43500.00", "43100.00", "43350.75", "1234.56",
             1_706_288_399_999_i64, "0", 10, "0", "0", "0"],
            [1_706_288_400_000_i64, "43350.75", "43400.00", "43200.00", "43300.00", "99.1",
             1_706_291_999_999_i64, "0", 10, "0", "0", "0"]
        ]);
        let rows: Vec<Vec<Value>> = serde_json::from_value(payload).unwrap();
        let bars = BinanceSource::parse_klines(&rows).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp, 1_706_284_800_000);
        assert_eq!(bars[0].open, 43_250.5);
        assert_eq!(bars[0].close, 43_350.75);
        assert_eq!(bars[1].volume, 99.1);
    }

    #[test]
    fn short_rows_are_format_errors() {
        let rows = vec![vec![json!(1), json!("1.0")]];
        assert!(matches!(
            BinanceSource::parse_klines(&rows),
            Err(DataError::ResponseFormat(_))
        ));
    }

    #[test]
    fn garbage_price_is_format_error() {
        let rows = vec![vec![
            json!(1),
            json!("abc"),
            json!("1"),
            json!("1"),
            json!("1"),
            json!("1"),
        ]];
        let err = BinanceSource::parse_klines(&rows).unwrap_err();
        assert!(err.to_string().contains("open"));
    }

    #[test]
    fn order_placement_is_unsupported() {
        let source = BinanceSource::new().unwrap();
        let err = source
            .place_order("BTCUSDT", &OrderRequest::close_all())
            .unwrap_err();
        assert!(matches!(err, DataError::UnsupportedOperation(_)));
    }
}
