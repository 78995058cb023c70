//! TOML backtest configuration.
//!
//! A config file has three sections:
//!
//! ```toml
//! [backtest]
//! symbol = "BTCUSDT"
//! interval = "1h"
//! limit = 500
//! initial_capital = 10000.0
//! max_positions = 1
//!
//! [data]
//! source = "synthetic"   # binance | csv | synthetic
//! seed = 42
//!
//! [strategy]
//! class = "MACrossoverStrategy"
//!
//! [strategy.params]
//! fast_period = 10
//! slow_period = 20
//! ```

use replaylab_core::data::{BarRequest, Interval};
use replaylab_core::engine::EngineConfig;
use replaylab_core::strategy::StrategyConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Content-addressed run identifier (hex BLAKE3 of the canonical JSON config).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Full configuration for one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    #[serde(default)]
    pub data: DataSection,
    pub strategy: StrategySection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    pub symbol: String,
    /// Candle interval; unknown values fall back to `1h` with a warning.
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default)]
    pub limit: Option<usize>,
    /// Window start, Unix ms.
    #[serde(default)]
    pub start_time: Option<i64>,
    /// Window end, Unix ms.
    #[serde(default)]
    pub end_time: Option<i64>,
    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,
    #[serde(default = "default_max_positions")]
    pub max_positions: usize,
    #[serde(default = "default_risk_per_trade")]
    pub risk_per_trade: f64,
}

/// Where bars come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum DataSection {
    Binance {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
    },
    Csv {
        path: PathBuf,
    },
    Synthetic {
        #[serde(default = "default_seed")]
        seed: u64,
        #[serde(default = "default_synthetic_bars")]
        bars: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        volatility: Option<f64>,
    },
}

impl Default for DataSection {
    fn default() -> Self {
        DataSection::Binance { base_url: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySection {
    /// Class identifier resolved by the strategy host.
    pub class: String,
    /// Optional strategy source file handed to the host as opaque text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_path: Option<PathBuf>,
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
}

fn default_interval() -> String {
    Interval::Hour1.as_str().to_string()
}

fn default_initial_capital() -> f64 {
    10_000.0
}

fn default_max_positions() -> usize {
    1
}

fn default_risk_per_trade() -> f64 {
    0.02
}

fn default_seed() -> u64 {
    42
}

fn default_synthetic_bars() -> usize {
    500
}

impl BacktestConfig {
    /// Parse a config from TOML text. Relative paths are kept as written.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a config file; relative data and code paths resolve against its directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&text)?;
        if let Some(dir) = path.parent() {
            config.resolve_paths(dir);
        }
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        if let DataSection::Csv { path } = &mut self.data {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        if let Some(code_path) = &mut self.strategy.code_path {
            if code_path.is_relative() {
                *code_path = base.join(&*code_path);
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bt = &self.backtest;
        if bt.symbol.trim().is_empty() {
            return Err(invalid("backtest.symbol must not be empty"));
        }
        if !bt.initial_capital.is_finite() || bt.initial_capital <= 0.0 {
            return Err(invalid(format!(
                "backtest.initial_capital must be positive, got {}",
                bt.initial_capital
            )));
        }
        if bt.max_positions == 0 {
            return Err(invalid("backtest.max_positions must be at least 1"));
        }
        if !(bt.risk_per_trade > 0.0 && bt.risk_per_trade <= 1.0) {
            return Err(invalid(format!(
                "backtest.risk_per_trade must be in (0, 1], got {}",
                bt.risk_per_trade
            )));
        }
        if bt.limit == Some(0) {
            return Err(invalid("backtest.limit must be at least 1"));
        }
        if let (Some(start), Some(end)) = (bt.start_time, bt.end_time) {
            if start > end {
                return Err(invalid(format!(
                    "backtest.start_time {start} is after end_time {end}"
                )));
            }
        }
        if self.strategy.class.trim().is_empty() {
            return Err(invalid("strategy.class must not be empty"));
        }
        if let DataSection::Synthetic {
            bars, volatility, ..
        } = &self.data
        {
            if *bars == 0 {
                return Err(invalid("data.bars must be at least 1"));
            }
            if let Some(v) = volatility {
                if !v.is_finite() || *v <= 0.0 {
                    return Err(invalid(format!("data.volatility must be positive, got {v}")));
                }
            }
        }
        Ok(())
    }

    /// Deterministic hash of this config: identical configs share a run id.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    pub fn interval(&self) -> Interval {
        Interval::normalize(&self.backtest.interval)
    }

    pub fn bar_request(&self) -> BarRequest {
        let bt = &self.backtest;
        let mut request = BarRequest::new(bt.symbol.clone(), self.interval());
        if let Some(limit) = bt.limit {
            request = request.limit(limit);
        }
        if let Some(start) = bt.start_time {
            request = request.start_time(start);
        }
        if let Some(end) = bt.end_time {
            request = request.end_time(end);
        }
        request
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(self.backtest.initial_capital, self.backtest.max_positions)
    }

    pub fn strategy_config(&self) -> StrategyConfig {
        StrategyConfig {
            max_positions: self.backtest.max_positions,
            risk_per_trade: self.backtest.risk_per_trade,
            initial_capital: self.backtest.initial_capital,
            params: self.strategy.params.clone(),
        }
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[backtest]
symbol = "BTCUSDT"

[strategy]
class = "MACrossoverStrategy"
"#;

    #[test]
    fn minimal_config_fills_defaults() {
        let config = BacktestConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.backtest.interval, "1h");
        assert_eq!(config.backtest.initial_capital, 10_000.0);
        assert_eq!(config.backtest.max_positions, 1);
        assert_eq!(config.backtest.risk_per_trade, 0.02);
        assert_eq!(config.data, DataSection::Binance { base_url: None });
        assert!(config.strategy.params.is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn data_sources_parse_by_tag() {
        let csv = BacktestConfig::from_toml(&format!(
            "{MINIMAL}\n[data]\nsource = \"csv\"\npath = \"bars.csv\"\n"
        ))
        .unwrap();
        assert_eq!(
            csv.data,
            DataSection::Csv {
                path: PathBuf::from("bars.csv")
            }
        );

        let synthetic = BacktestConfig::from_toml(&format!(
            "{MINIMAL}\n[data]\nsource = \"synthetic\"\nbars = 50\n"
        ))
        .unwrap();
        assert_eq!(
            synthetic.data,
            DataSection::Synthetic {
                seed: 42,
                bars: 50,
                volatility: None
            }
        );
    }

    #[test]
    fn unknown_source_is_a_parse_error() {
        let result = BacktestConfig::from_toml(&format!("{MINIMAL}\n[data]\nsource = \"ftp\"\n"));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn params_keep_their_toml_types() {
        let config = BacktestConfig::from_toml(&format!(
            "{MINIMAL}\n[strategy.params]\nfast_period = 5\nmax_allocation = 0.5\n"
        ))
        .unwrap();
        let strategy = config.strategy_config();
        assert_eq!(strategy.param_period("fast_period", 10).unwrap(), 5);
        assert_eq!(strategy.param_f64("max_allocation", 0.95).unwrap(), 0.5);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = BacktestConfig::from_toml(MINIMAL).unwrap();
        config.backtest.max_positions = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = BacktestConfig::from_toml(MINIMAL).unwrap();
        config.backtest.initial_capital = 0.0;
        assert!(config.validate().is_err());

        let mut config = BacktestConfig::from_toml(MINIMAL).unwrap();
        config.backtest.risk_per_trade = 1.5;
        assert!(config.validate().is_err());

        let mut config = BacktestConfig::from_toml(MINIMAL).unwrap();
        config.backtest.start_time = Some(10);
        config.backtest.end_time = Some(5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn run_id_is_deterministic_and_content_addressed() {
        let a = BacktestConfig::from_toml(MINIMAL).unwrap();
        let b = BacktestConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(a.run_id().unwrap(), b.run_id().unwrap());
        assert_eq!(a.run_id().unwrap().len(), 64);

        let mut c = a.clone();
        c.backtest.max_positions = 2;
        assert_ne!(a.run_id().unwrap(), c.run_id().unwrap());
    }

    #[test]
    fn bar_request_carries_window_and_normalized_interval() {
        let mut config = BacktestConfig::from_toml(MINIMAL).unwrap();
        config.backtest.interval = "4H".into();
        config.backtest.limit = Some(200);
        config.backtest.start_time = Some(1_000);
        let request = config.bar_request();
        assert_eq!(request.interval, Interval::Hour4);
        assert_eq!(request.limit, Some(200));
        assert_eq!(request.start_time, Some(1_000));
        assert_eq!(request.end_time, None);
    }

    #[test]
    fn unknown_interval_falls_back_to_one_hour() {
        let mut config = BacktestConfig::from_toml(MINIMAL).unwrap();
        config.backtest.interval = "7x".into();
        assert_eq!(config.interval(), Interval::Hour1);
    }

    #[test]
    fn from_file_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(
            &path,
            "[backtest]\nsymbol = \"X\"\n\n[data]\nsource = \"csv\"\npath = \"bars.csv\"\n\n\
             [strategy]\nclass = \"MACrossoverStrategy\"\ncode_path = \"strat.py\"\n",
        )
        .unwrap();

        let config = BacktestConfig::from_file(&path).unwrap();
        assert_eq!(
            config.data,
            DataSection::Csv {
                path: dir.path().join("bars.csv")
            }
        );
        assert_eq!(config.strategy.code_path, Some(dir.path().join("strat.py")));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = BacktestConfig::from_file(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
