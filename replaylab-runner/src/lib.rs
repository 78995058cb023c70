//! ReplayLab Runner: backtest orchestration, configuration, metrics, artifacts.
//!
//! This crate builds on `replaylab-core` to provide:
//! - TOML run configuration with a content-addressed run id
//! - Broker construction from the `[data]` section
//! - Single-backtest runner with metrics and trade counts
//! - Artifact export (result JSON, trade ledger CSV, equity CSV)

pub mod config;
pub mod metrics;
pub mod reporting;
pub mod runner;

pub use config::{BacktestConfig, BacktestSection, ConfigError, DataSection, RunId, StrategySection};
pub use metrics::PerformanceMetrics;
pub use reporting::{save_artifacts, ArtifactManager, ArtifactPaths};
pub use runner::{
    broker_for, run_backtest, run_from_config, run_with_broker, BacktestResult, RunError, RunReport,
};
