//! ReplayLab Core: engine, domain types, data sources, strategy host.
//!
//! This crate contains the heart of the backtester:
//! - Domain types (bars, order requests, positions, closed trades)
//! - Bar-by-bar replay loop with protective exits evaluated before the strategy
//! - Market-data sources behind the `Broker` trait (Binance, CSV, memory, synthetic)
//! - Strategy trait, host registry and bundled example strategies
//! - Indicators used by the bundled strategies

pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod strategy;

pub use error::EngineError;
