//! Order — an ephemeral instruction to the simulated broker.
//!
//! Orders are created and resolved within a single bar; only the resulting
//! `TradeRecord` persists. The reject taxonomy covers the four expected,
//! recoverable per-order conditions: the broker records them as no-fill
//! trade entries and the run continues.

use super::trade::StopKind;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Requested order size: an explicit share count or a cash notional.
///
/// Notional buys are resolved to whole board lots (multiples of 100 shares)
/// at the fill price. Sells are always share-denominated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrderSize {
    Shares(u64),
    Notional(f64),
}

/// Where the order came from. Forced exits carry the stop that fired and
/// bypass the signal-sell clamp rules in the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSource {
    Signal,
    ForcedExit(StopKind),
    Rebalance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub symbol: String,
    pub side: OrderSide,
    pub size: OrderSize,
    pub date: NaiveDate,
    pub source: OrderSource,
}

impl Order {
    /// Signal-originated buy for a cash notional.
    pub fn signal_buy(symbol: impl Into<String>, notional: f64, date: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            side: OrderSide::Buy,
            size: OrderSize::Notional(notional),
            date,
            source: OrderSource::Signal,
        }
    }

    /// Signal-originated sell of an explicit share count.
    pub fn signal_sell(symbol: impl Into<String>, quantity: u64, date: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            side: OrderSide::Sell,
            size: OrderSize::Shares(quantity),
            date,
            source: OrderSource::Signal,
        }
    }

    /// Forced exit issued by the risk manager; clamped to the sellable
    /// quantity at execution rather than rejected.
    pub fn forced_exit(
        symbol: impl Into<String>,
        quantity: u64,
        date: NaiveDate,
        stop: StopKind,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side: OrderSide::Sell,
            size: OrderSize::Shares(quantity),
            date,
            source: OrderSource::ForcedExit(stop),
        }
    }

    pub fn is_forced(&self) -> bool {
        matches!(self.source, OrderSource::ForcedExit(_))
    }

    pub fn stop_kind(&self) -> Option<StopKind> {
        match self.source {
            OrderSource::ForcedExit(kind) => Some(kind),
            _ => None,
        }
    }
}

/// Expected, recoverable per-order rejection reasons.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum OrderReject {
    #[error("insufficient cash: need {required:.2}, available {available:.2}")]
    InsufficientCash { required: f64, available: f64 },

    #[error("insufficient sellable shares: requested {requested}, sellable {sellable} (T+1)")]
    InsufficientSellableShares { requested: u64, sellable: u64 },

    #[error("price limit breached: fill {price:.2} outside band [{floor:.2}, {ceiling:.2}]")]
    PriceLimitBreached {
        price: f64,
        floor: f64,
        ceiling: f64,
    },

    #[error("invalid order: {0}")]
    InvalidOrder(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    #[test]
    fn forced_exit_carries_stop_kind() {
        let order = Order::forced_exit("600519", 300, d(), StopKind::Hard);
        assert!(order.is_forced());
        assert_eq!(order.stop_kind(), Some(StopKind::Hard));
    }

    #[test]
    fn signal_orders_have_no_stop_kind() {
        assert_eq!(Order::signal_buy("600519", 10_000.0, d()).stop_kind(), None);
        assert_eq!(Order::signal_sell("600519", 100, d()).stop_kind(), None);
    }

    #[test]
    fn reject_messages_are_descriptive() {
        let err = OrderReject::InsufficientSellableShares {
            requested: 500,
            sellable: 0,
        };
        assert!(err.to_string().contains("T+1"));
    }
}
