use super::provider::{ensure_time_ordered, BarRequest, Broker, DataError};
use crate::domain::Bar;

/// Serves a fixed, pre-loaded bar series. Used by tests and by callers that
/// already hold their data.
pub struct MemorySource {
    name: String,
    bars: Vec<Bar>,
}

impl MemorySource {
    pub fn new(bars: Vec<Bar>) -> Result<Self, DataError> {
        Self::named("memory", bars)
    }

    pub fn named(name: impl Into<String>, bars: Vec<Bar>) -> Result<Self, DataError> {
        ensure_time_ordered(&bars)?;
        Ok(Self {
            name: name.into(),
            bars,
        })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }
}

impl Broker for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, request: &BarRequest) -> Result<Vec<Bar>, DataError> {
        Ok(request.apply_window(self.bars.clone()))
    }
}
