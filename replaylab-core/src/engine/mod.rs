//! Replay engine: bar-by-bar loop, position bookkeeping, fill resolution.
//!
//! The engine consumes a time-ordered bar series and a strategy, and runs
//! three phases per bar:
//!
//! 1. Protective exits (trailing ratchet, stop-loss, take-profit)
//! 2. Strategy decision and order resolution
//! 3. Mark-to-market into the equity curve

pub mod fill;
pub mod loop_runner;
pub mod state;

pub use fill::resolve_fill_price;
pub use loop_runner::{run_backtest, Engine};
pub use state::{EngineConfig, EngineState, NoFillReason, RunResult};
