//! Order requests: the strategy-issued intents the engine turns into fills.
//!
//! On the wire an order request is a flat record tagged by `action`:
//!
//! ```json
//! {"action": "BUY", "quantity": 10, "order_type": "LIMIT", "price": 99.5,
//!  "stop_loss_pct": 0.02, "take_profit_pct": 0.05}
//! ```
//!
//! Unknown actions fail deserialization instead of defaulting to anything.

use super::position::PositionSide;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the fill price is determined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Fill at the bar's close.
    #[default]
    Market,
    /// Fill at the requested price, only if the bar traded through it.
    Limit,
}

/// Why a position was closed.
///
/// Built-in reasons serialize as their SCREAMING_SNAKE_CASE tag; anything a
/// strategy supplies is carried through verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    #[default]
    StrategySignal,
    EndOfBacktest,
    Custom(String),
}

impl ExitReason {
    pub fn as_str(&self) -> &str {
        match self {
            ExitReason::StopLoss => "STOP_LOSS",
            ExitReason::TakeProfit => "TAKE_PROFIT",
            ExitReason::StrategySignal => "STRATEGY_SIGNAL",
            ExitReason::EndOfBacktest => "END_OF_BACKTEST",
            ExitReason::Custom(reason) => reason,
        }
    }
}

impl From<String> for ExitReason {
    fn from(value: String) -> Self {
        match value.as_str() {
            "STOP_LOSS" => ExitReason::StopLoss,
            "TAKE_PROFIT" => ExitReason::TakeProfit,
            "STRATEGY_SIGNAL" => ExitReason::StrategySignal,
            "END_OF_BACKTEST" => ExitReason::EndOfBacktest,
            _ => ExitReason::Custom(value),
        }
    }
}

impl From<&str> for ExitReason {
    fn from(value: &str) -> Self {
        ExitReason::from(value.to_string())
    }
}

impl From<ExitReason> for String {
    fn from(value: ExitReason) -> Self {
        match value {
            ExitReason::Custom(reason) => reason,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sizing, price constraint and protective levels for `BUY` / `SELL`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryTerms {
    pub quantity: f64,
    #[serde(default)]
    pub order_type: OrderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_stop: Option<f64>,
    /// Informational only: `SELL` decides exit-vs-short from current exposure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_side: Option<PositionSide>,
    /// Used when a `SELL` closes a long.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_reason: Option<ExitReason>,
}

impl EntryTerms {
    pub fn market(quantity: f64) -> Self {
        Self {
            quantity,
            order_type: OrderType::Market,
            price: None,
            stop_loss: None,
            stop_loss_pct: None,
            take_profit: None,
            take_profit_pct: None,
            trailing_stop: None,
            position_side: None,
            exit_reason: None,
        }
    }

    pub fn limit(quantity: f64, price: f64) -> Self {
        Self {
            order_type: OrderType::Limit,
            price: Some(price),
            ..Self::market(quantity)
        }
    }

    pub fn stop_loss(mut self, price: f64) -> Self {
        self.stop_loss = Some(price);
        self
    }

    pub fn stop_loss_pct(mut self, pct: f64) -> Self {
        self.stop_loss_pct = Some(pct);
        self
    }

    pub fn take_profit(mut self, price: f64) -> Self {
        self.take_profit = Some(price);
        self
    }

    pub fn take_profit_pct(mut self, pct: f64) -> Self {
        self.take_profit_pct = Some(pct);
        self
    }

    pub fn trailing_stop(mut self, pct: f64) -> Self {
        self.trailing_stop = Some(pct);
        self
    }

    pub fn position_side(mut self, side: PositionSide) -> Self {
        self.position_side = Some(side);
        self
    }

    pub fn exit_reason(mut self, reason: impl Into<ExitReason>) -> Self {
        self.exit_reason = Some(reason.into());
        self
    }

    /// Absolute stop for a position of `side` filled at `fill_price`.
    /// The absolute field wins over the percent form.
    pub fn resolve_stop_loss(&self, side: PositionSide, fill_price: f64) -> Option<f64> {
        self.stop_loss.or_else(|| {
            self.stop_loss_pct.map(|pct| match side {
                PositionSide::Long => fill_price * (1.0 - pct),
                PositionSide::Short => fill_price * (1.0 + pct),
            })
        })
    }

    /// Absolute target for a position of `side` filled at `fill_price`.
    /// The absolute field wins over the percent form.
    pub fn resolve_take_profit(&self, side: PositionSide, fill_price: f64) -> Option<f64> {
        self.take_profit.or_else(|| {
            self.take_profit_pct.map(|pct| match side {
                PositionSide::Long => fill_price * (1.0 + pct),
                PositionSide::Short => fill_price * (1.0 - pct),
            })
        })
    }
}

/// Terms for `CLOSE`: which position, and at what price.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloseTerms {
    #[serde(default)]
    pub order_type: OrderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Close the first open position of this side; FIFO over all when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_side: Option<PositionSide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_reason: Option<ExitReason>,
}

/// Terms for `CLOSE_ALL`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloseAllTerms {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_reason: Option<ExitReason>,
}

/// A strategy-issued order intent. Plain data with no identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderRequest {
    /// Open a long.
    Buy(EntryTerms),
    /// Close the earliest long if one is open, otherwise open a short.
    Sell(EntryTerms),
    /// Close one position.
    Close(CloseTerms),
    /// Close every open position at the bar's close.
    CloseAll(CloseAllTerms),
}

impl OrderRequest {
    pub fn buy(terms: EntryTerms) -> Self {
        OrderRequest::Buy(terms)
    }

    pub fn sell(terms: EntryTerms) -> Self {
        OrderRequest::Sell(terms)
    }

    /// Market close of the earliest-opened position.
    pub fn close() -> Self {
        OrderRequest::Close(CloseTerms::default())
    }

    /// Market close of the first open position on `side`.
    pub fn close_side(side: PositionSide) -> Self {
        OrderRequest::Close(CloseTerms {
            position_side: Some(side),
            ..CloseTerms::default()
        })
    }

    pub fn close_all() -> Self {
        OrderRequest::CloseAll(CloseAllTerms::default())
    }

    pub fn close_all_because(reason: impl Into<ExitReason>) -> Self {
        OrderRequest::CloseAll(CloseAllTerms {
            exit_reason: Some(reason.into()),
        })
    }

    /// Wire tag of the action.
    pub fn action(&self) -> &'static str {
        match self {
            OrderRequest::Buy(_) => "BUY",
            OrderRequest::Sell(_) => "SELL",
            OrderRequest::Close(_) => "CLOSE",
            OrderRequest::CloseAll(_) => "CLOSE_ALL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_flat_buy() {
        let json = r#"{"action":"BUY","quantity":10,"order_type":"LIMIT","price":99.5,
                       "stop_loss_pct":0.02,"exit_reason":"MA_CROSSOVER_ENTRY"}"#;
        let order: OrderRequest = serde_json::from_str(json).unwrap();
        let OrderRequest::Buy(terms) = order else {
            panic!("expected BUY");
        };
        assert_eq!(terms.quantity, 10.0);
        assert_eq!(terms.order_type, OrderType::Limit);
        assert_eq!(terms.price, Some(99.5));
        assert_eq!(terms.stop_loss_pct, Some(0.02));
        assert_eq!(
            terms.exit_reason,
            Some(ExitReason::Custom("MA_CROSSOVER_ENTRY".into()))
        );
    }

    #[test]
    fn order_type_defaults_to_market() {
        let order: OrderRequest =
            serde_json::from_str(r#"{"action":"SELL","quantity":1.5}"#).unwrap();
        assert_eq!(order, OrderRequest::sell(EntryTerms::market(1.5)));
    }

    #[test]
    fn close_all_needs_no_fields() {
        let order: OrderRequest = serde_json::from_str(r#"{"action":"CLOSE_ALL"}"#).unwrap();
        assert_eq!(order, OrderRequest::close_all());
        assert_eq!(order.action(), "CLOSE_ALL");
    }

    #[test]
    fn unknown_action_is_rejected() {
        let result = serde_json::from_str::<OrderRequest>(r#"{"action":"HODL","quantity":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn buy_requires_quantity() {
        let result = serde_json::from_str::<OrderRequest>(r#"{"action":"BUY"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn builtin_exit_reasons_parse_to_variants() {
        let reason: ExitReason = serde_json::from_str(r#""STOP_LOSS""#).unwrap();
        assert_eq!(reason, ExitReason::StopLoss);
        assert_eq!(
            serde_json::to_string(&ExitReason::EndOfBacktest).unwrap(),
            r#""END_OF_BACKTEST""#
        );
        assert_eq!(ExitReason::from("RSI_NEUTRAL_EXIT").to_string(), "RSI_NEUTRAL_EXIT");
    }

    #[test]
    fn absolute_level_wins_over_percent() {
        let terms = EntryTerms::market(1.0).stop_loss(90.0).stop_loss_pct(0.02);
        assert_eq!(terms.resolve_stop_loss(PositionSide::Long, 100.0), Some(90.0));
    }

    #[test]
    fn percent_levels_follow_side() {
        let terms = EntryTerms::market(1.0)
            .stop_loss_pct(0.02)
            .take_profit_pct(0.05);
        assert_eq!(terms.resolve_stop_loss(PositionSide::Long, 100.0), Some(98.0));
        assert_eq!(terms.resolve_take_profit(PositionSide::Long, 100.0), Some(105.0));
        assert_eq!(terms.resolve_stop_loss(PositionSide::Short, 100.0), Some(102.0));
        assert_eq!(terms.resolve_take_profit(PositionSide::Short, 100.0), Some(95.0));
    }
}
