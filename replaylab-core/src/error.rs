//! Engine-level error taxonomy.
//!
//! Only conditions that abort a run are errors. Orders that cannot fill
//! (insufficient capital, limit outside the bar range, capacity reached) are
//! silent no-fill outcomes and never surface here.

use crate::data::DataError;
use crate::strategy::StrategyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The market-data source returned no bars. Raised before any state is touched.
    #[error("no historical data available for backtest")]
    NoData,

    /// Network/API failure from the data source, propagated unchanged.
    #[error("upstream data error: {0}")]
    UpstreamData(DataError),

    /// The strategy host could not build or initialize the strategy.
    #[error("strategy instantiation failed: {0}")]
    StrategyInstantiation(#[from] StrategyError),

    /// A capability that does not exist in replay mode was requested.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("invalid engine config: {0}")]
    InvalidConfig(String),
}

impl From<DataError> for EngineError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::UnsupportedOperation(op) => EngineError::UnsupportedOperation(op),
            other => EngineError::UpstreamData(other),
        }
    }
}
