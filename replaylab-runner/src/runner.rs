//! Backtest runner: wires together data source, strategy host, engine and metrics.
//!
//! Entry points:
//! - `run_backtest()`: a strategy over pre-loaded bars. No I/O.
//! - `run_with_broker()`: fetches bars from a broker handle, builds the strategy, runs.
//! - `run_from_config()`: builds the broker from the `[data]` section, then as above.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use replaylab_core::data::{BinanceSource, Broker, CsvSource, SyntheticSource};
use replaylab_core::domain::{Bar, ClosedTrade};
use replaylab_core::engine::{Engine, EngineConfig, NoFillReason, RunResult};
use replaylab_core::strategy::{Strategy, StrategyHost, StrategySource};
use replaylab_core::EngineError;

use crate::config::{BacktestConfig, ConfigError, DataSection, RunId};
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("failed to read strategy code {path}: {source}")]
    StrategyCode {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub initial_capital: f64,
    pub final_capital: f64,
    pub metrics: PerformanceMetrics,
    pub trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<f64>,
    pub total_trades: usize,
    /// Trades with `pnl > 0`.
    pub winning_trades: usize,
    /// Trades with `pnl <= 0`; breakeven counts as losing.
    pub losing_trades: usize,
    pub bar_count: usize,
    pub no_fills: BTreeMap<NoFillReason, usize>,
}

impl From<RunResult> for BacktestResult {
    fn from(run: RunResult) -> Self {
        let metrics = PerformanceMetrics::compute(
            run.initial_capital,
            run.final_capital,
            &run.trades,
            &run.equity_curve,
        );
        let winning_trades = run.trades.iter().filter(|t| t.is_winner()).count();
        Self {
            initial_capital: run.initial_capital,
            final_capital: run.final_capital,
            metrics,
            total_trades: run.trades.len(),
            winning_trades,
            losing_trades: run.trades.len() - winning_trades,
            trades: run.trades,
            equity_curve: run.equity_curve,
            bar_count: run.bar_count,
            no_fills: run.no_fills,
        }
    }
}

/// A finished run together with the config that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub config: BacktestConfig,
    pub result: BacktestResult,
}

/// Replay `strategy` over `bars` and compute metrics.
pub fn run_backtest(
    strategy: &mut dyn Strategy,
    bars: &[Bar],
    initial_capital: f64,
    max_positions: usize,
) -> Result<BacktestResult, EngineError> {
    let engine = Engine::new(EngineConfig::new(initial_capital, max_positions));
    let run = engine.run(strategy, bars)?;
    Ok(BacktestResult::from(run))
}

/// Run a configured backtest against an existing broker handle.
pub fn run_with_broker(
    config: &BacktestConfig,
    broker: Arc<dyn Broker>,
    host: &dyn StrategyHost,
) -> Result<RunReport, RunError> {
    config.validate()?;
    let run_id = config.run_id()?;
    let request = config.bar_request();

    tracing::info!(
        run_id = %run_id,
        symbol = %request.symbol,
        interval = %request.interval,
        source = broker.name(),
        strategy = %config.strategy.class,
        "starting backtest"
    );

    // ─── Load bars ───
    let bars = broker.fetch(&request).map_err(EngineError::from)?;
    if bars.is_empty() {
        return Err(EngineError::NoData.into());
    }
    tracing::debug!(bars = bars.len(), "bars loaded");

    // ─── Build strategy ───
    let source = strategy_source(config)?;
    let mut strategy = host
        .instantiate(&source, Arc::clone(&broker), config.strategy_config())
        .map_err(EngineError::from)?;

    // ─── Replay ───
    let result = run_backtest(
        strategy.as_mut(),
        &bars,
        config.backtest.initial_capital,
        config.backtest.max_positions,
    )?;

    tracing::info!(
        run_id = %run_id,
        trades = result.total_trades,
        final_capital = result.final_capital,
        total_return = result.metrics.total_return,
        "backtest finished"
    );

    Ok(RunReport {
        run_id,
        config: config.clone(),
        result,
    })
}

/// Run a configured backtest, building the broker from the `[data]` section.
pub fn run_from_config(
    config: &BacktestConfig,
    host: &dyn StrategyHost,
) -> Result<RunReport, RunError> {
    let broker = broker_for(&config.data)?;
    run_with_broker(config, broker, host)
}

/// Build the market-data source described by a `[data]` section.
pub fn broker_for(data: &DataSection) -> Result<Arc<dyn Broker>, RunError> {
    let broker: Arc<dyn Broker> = match data {
        DataSection::Binance { base_url: None } => {
            Arc::new(BinanceSource::new().map_err(EngineError::from)?)
        }
        DataSection::Binance {
            base_url: Some(url),
        } => Arc::new(BinanceSource::with_base_url(url.clone()).map_err(EngineError::from)?),
        DataSection::Csv { path } => Arc::new(CsvSource::new(path.clone())),
        DataSection::Synthetic {
            seed,
            bars,
            volatility,
        } => {
            let mut source = SyntheticSource::new(*seed, *bars);
            if let Some(v) = volatility {
                source = source.volatility(*v);
            }
            Arc::new(source)
        }
    };
    Ok(broker)
}

fn strategy_source(config: &BacktestConfig) -> Result<StrategySource, RunError> {
    let class_name = config.strategy.class.clone();
    match &config.strategy.code_path {
        None => Ok(StrategySource::builtin(class_name)),
        Some(path) => {
            let code = std::fs::read_to_string(path).map_err(|source| RunError::StrategyCode {
                path: path.clone(),
                source,
            })?;
            Ok(StrategySource { class_name, code })
        }
    }
}
