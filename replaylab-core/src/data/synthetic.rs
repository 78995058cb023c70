//! Deterministic synthetic bars for offline demos and tests.
//!
//! Prices follow a bounded multiplicative random walk. The RNG stream for a
//! request is derived from `(seed, symbol, interval)` with BLAKE3, so the same
//! source returns identical bars for the same request on every call and
//! different symbols get independent series.

use super::provider::{BarRequest, Broker, DataError, Interval};
use crate::domain::Bar;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 2024-01-01T00:00:00Z
pub const DEFAULT_START_MS: i64 = 1_704_067_200_000;

#[derive(Debug, Clone)]
pub struct SyntheticSource {
    seed: u64,
    bar_count: usize,
    start_price: f64,
    /// Maximum absolute close-to-close move per bar, as a fraction.
    volatility: f64,
}

impl SyntheticSource {
    pub fn new(seed: u64, bar_count: usize) -> Self {
        Self {
            seed,
            bar_count,
            start_price: 100.0,
            volatility: 0.02,
        }
    }

    pub fn start_price(mut self, price: f64) -> Self {
        self.start_price = price;
        self
    }

    pub fn volatility(mut self, volatility: f64) -> Self {
        self.volatility = volatility;
        self
    }

    fn stream_seed(&self, symbol: &str, interval: Interval) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(symbol.as_bytes());
        hasher.update(interval.as_str().as_bytes());
        let hash = hasher.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(head)
    }

    /// Generate the full series for a request, before windowing.
    pub fn generate(&self, request: &BarRequest) -> Vec<Bar> {
        let mut rng = StdRng::seed_from_u64(self.stream_seed(&request.symbol, request.interval));
        let step = request.interval.duration_ms();
        let start = request.start_time.unwrap_or(DEFAULT_START_MS);
        let vol = self.volatility.abs();

        let mut bars = Vec::with_capacity(self.bar_count);
        let mut prev_close = self.start_price;
        for i in 0..self.bar_count {
            let open = prev_close;
            let change = if vol > 0.0 {
                rng.gen_range(-vol..vol)
            } else {
                0.0
            };
            let close = open * (1.0 + change);
            let wick_up: f64 = rng.gen_range(0.0..=vol / 2.0);
            let wick_down: f64 = rng.gen_range(0.0..=vol / 2.0);
            let high = open.max(close) * (1.0 + wick_up);
            let low = open.min(close) * (1.0 - wick_down);
            let volume = rng.gen_range(100.0..1_000.0);

            bars.push(Bar::new(start + i as i64 * step, open, high, low, close, volume));
            prev_close = close;
        }
        bars
    }
}

impl Broker for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, request: &BarRequest) -> Result<Vec<Bar>, DataError> {
        if !(self.start_price.is_finite() && self.start_price > 0.0) {
            return Err(DataError::InvalidRequest(format!(
                "synthetic start price must be positive, got {}",
                self.start_price
            )));
        }
        if !(self.volatility.is_finite() && self.volatility.abs() < 1.0) {
            return Err(DataError::InvalidRequest(format!(
                "synthetic volatility must be below 1.0, got {}",
                self.volatility
            )));
        }
        Ok(request.apply_window(self.generate(request)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(symbol: &str) -> BarRequest {
        BarRequest::new(symbol, Interval::Hour1)
    }

    #[test]
    fn same_request_same_bars() {
        let source = SyntheticSource::new(42, 200);
        assert_eq!(
            source.fetch(&request("BTCUSDT")).unwrap(),
            source.fetch(&request("BTCUSDT")).unwrap()
        );
    }

    #[test]
    fn symbols_get_independent_series() {
        let source = SyntheticSource::new(42, 50);
        let a = source.fetch(&request("BTCUSDT")).unwrap();
        let b = source.fetch(&request("ETHUSDT")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn bars_are_sane_and_spaced_by_interval() {
        let bars = SyntheticSource::new(7, 300)
            .volatility(0.05)
            .fetch(&request("X"))
            .unwrap();
        assert_eq!(bars.len(), 300);
        assert!(bars.iter().all(Bar::is_sane));
        assert!(bars
            .windows(2)
            .all(|w| w[1].timestamp - w[0].timestamp == 3_600_000));
        assert_eq!(bars[0].timestamp, DEFAULT_START_MS);
        assert_eq!(bars[0].open, 100.0);
    }

    #[test]
    fn limit_keeps_most_recent() {
        let source = SyntheticSource::new(1, 100);
        let full = source.fetch(&request("X")).unwrap();
        let tail = source.fetch(&request("X").limit(10)).unwrap();
        assert_eq!(tail.as_slice(), &full[90..]);
    }

    #[test]
    fn rejects_nonsense_parameters() {
        let source = SyntheticSource::new(1, 10).start_price(-5.0);
        assert!(matches!(
            source.fetch(&request("X")),
            Err(DataError::InvalidRequest(_))
        ));
    }
}
