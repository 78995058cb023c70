//! Strategy contract: one bar in, zero or more order requests out.
//!
//! The engine never inspects strategy internals. A strategy sees bars strictly
//! in time order, exactly once each, and answers with a [`Decision`].

pub mod builtin;
pub mod config;
pub mod host;

pub use config::StrategyConfig;
pub use host::{BuiltinHost, StrategyContext, StrategyFactory, StrategyHost, StrategySource};

use crate::domain::{Bar, OrderRequest};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("strategy class '{0}' not found")]
    UnknownClass(String),

    #[error("invalid strategy parameter '{name}': {reason}")]
    InvalidParam { name: String, reason: String },

    #[error("strategy initialization failed: {0}")]
    Initialization(String),
}

/// A trading strategy driven by the replay loop.
pub trait Strategy: Send {
    /// Display name.
    fn name(&self) -> &str;

    /// Called once before the first bar.
    fn initialize(&mut self) -> Result<(), StrategyError> {
        Ok(())
    }

    /// Called once per bar, after protective exits have been processed.
    fn on_bar(&mut self, bar: &Bar) -> Decision;
}

/// What a strategy wants done on this bar.
///
/// On the wire: `null`, a single order object, or an array of orders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Decision {
    #[default]
    Hold,
    Single(OrderRequest),
    Batch(Vec<OrderRequest>),
}

impl Decision {
    /// Orders in submission order.
    pub fn into_orders(self) -> Vec<OrderRequest> {
        match self {
            Decision::Hold => Vec::new(),
            Decision::Single(order) => vec![order],
            Decision::Batch(orders) => orders,
        }
    }

    pub fn is_hold(&self) -> bool {
        matches!(self, Decision::Hold)
    }
}

impl From<OrderRequest> for Decision {
    fn from(order: OrderRequest) -> Self {
        Decision::Single(order)
    }
}

impl From<Vec<OrderRequest>> for Decision {
    fn from(orders: Vec<OrderRequest>) -> Self {
        Decision::Batch(orders)
    }
}

impl From<Option<OrderRequest>> for Decision {
    fn from(order: Option<OrderRequest>) -> Self {
        order.map_or(Decision::Hold, Decision::Single)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntryTerms;

    #[test]
    fn decision_wire_forms() {
        let hold: Decision = serde_json::from_str("null").unwrap();
        assert!(hold.is_hold());

        let single: Decision =
            serde_json::from_str(r#"{"action":"BUY","quantity":2}"#).unwrap();
        assert_eq!(single.into_orders().len(), 1);

        let batch: Decision = serde_json::from_str(
            r#"[{"action":"CLOSE_ALL"},{"action":"SELL","quantity":1}]"#,
        )
        .unwrap();
        let orders = batch.into_orders();
        assert_eq!(orders[0].action(), "CLOSE_ALL");
        assert_eq!(orders[1].action(), "SELL");
    }

    #[test]
    fn conversions_preserve_order() {
        let orders = vec![
            OrderRequest::buy(EntryTerms::market(1.0)),
            OrderRequest::close(),
        ];
        assert_eq!(Decision::from(orders.clone()).into_orders(), orders);
        assert!(Decision::from(None).is_hold());
        assert_eq!(
            Decision::from(Some(OrderRequest::close_all())).into_orders(),
            vec![OrderRequest::close_all()]
        );
    }
}
