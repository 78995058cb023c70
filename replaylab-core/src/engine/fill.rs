//! Fill price resolution.

use crate::domain::{Bar, OrderType};

/// Price at which an order fills on `bar`, or `None` for no fill.
///
/// Market orders, and orders without a price, fill at the close. Limit orders
/// with a price fill at that price only if the bar's range contains it.
pub fn resolve_fill_price(order_type: OrderType, price: Option<f64>, bar: &Bar) -> Option<f64> {
    match (order_type, price) {
        (OrderType::Limit, Some(limit)) => bar.contains_price(limit).then_some(limit),
        _ => Some(bar.close),
    }
}
