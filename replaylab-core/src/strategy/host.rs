//! Strategy host: turns a strategy source plus class name into a live strategy.
//!
//! The engine consumes only the [`Strategy`] trait. How a strategy is obtained
//! is the host's business. [`BuiltinHost`] is a registry of compiled-in
//! factories keyed by class name; other hosts may interpret `code`.

use super::builtin;
use super::{Strategy, StrategyConfig, StrategyError};
use crate::data::Broker;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Where a strategy comes from: opaque source text and the class to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategySource {
    pub class_name: String,
    pub code: String,
}

impl StrategySource {
    /// A compiled-in strategy, named by class only.
    pub fn builtin(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            code: String::new(),
        }
    }
}

/// Everything a factory gets to build a strategy.
pub struct StrategyContext {
    pub broker: Arc<dyn Broker>,
    pub config: StrategyConfig,
}

pub type StrategyFactory = fn(StrategyContext) -> Result<Box<dyn Strategy>, StrategyError>;

/// Builds strategies for the engine.
pub trait StrategyHost {
    fn instantiate(
        &self,
        source: &StrategySource,
        broker: Arc<dyn Broker>,
        config: StrategyConfig,
    ) -> Result<Box<dyn Strategy>, StrategyError>;
}

/// Registry of compiled-in strategy factories.
#[derive(Default)]
pub struct BuiltinHost {
    factories: BTreeMap<String, StrategyFactory>,
}

impl BuiltinHost {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the bundled example strategies.
    pub fn with_builtins() -> Self {
        let mut host = Self::new();
        host.register(builtin::MaCrossover::CLASS_NAME, builtin::MaCrossover::factory);
        host.register(
            builtin::RsiMeanReversion::CLASS_NAME,
            builtin::RsiMeanReversion::factory,
        );
        host.register(builtin::MacdMomentum::CLASS_NAME, builtin::MacdMomentum::factory);
        host
    }

    pub fn register(&mut self, class_name: impl Into<String>, factory: StrategyFactory) {
        self.factories.insert(class_name.into(), factory);
    }

    /// Registered class names, sorted.
    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl StrategyHost for BuiltinHost {
    fn instantiate(
        &self,
        source: &StrategySource,
        broker: Arc<dyn Broker>,
        config: StrategyConfig,
    ) -> Result<Box<dyn Strategy>, StrategyError> {
        let factory = self
            .factories
            .get(&source.class_name)
            .ok_or_else(|| StrategyError::UnknownClass(source.class_name.clone()))?;
        if !source.code.is_empty() {
            tracing::debug!(
                class = %source.class_name,
                "builtin host ignores supplied strategy code"
            );
        }
        factory(StrategyContext { broker, config })
    }
}
