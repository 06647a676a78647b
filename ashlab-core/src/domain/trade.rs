//! TradeRecord — one entry in the append-only audit ledger.
//!
//! Every order resolution produces exactly one record: fills carry the money
//! movement, rejections are recorded as no-fill events so the log explains
//! why a signal left no trace on the account.

use super::order::{OrderReject, OrderSide};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which stop rule forced an exit. `Drawdown` marks account-level
/// liquidation after the drawdown ceiling breach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopKind {
    Hard,
    Trailing,
    Time,
    Volatility,
    Drawdown,
}

impl StopKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StopKind::Hard => "hard_stop",
            StopKind::Trailing => "trailing_stop",
            StopKind::Time => "time_stop",
            StopKind::Volatility => "volatility_stop",
            StopKind::Drawdown => "drawdown_halt",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TradeStatus {
    Filled,
    Rejected(OrderReject),
}

/// A single ledger entry. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub date: NaiveDate,
    pub side: OrderSide,
    pub status: TradeStatus,
    /// Filled quantity; zero for rejected orders.
    pub quantity: u64,
    /// Fill price post-slippage; zero for rejected orders.
    pub price: f64,
    pub commission: f64,
    pub stamp_tax: f64,
    /// Signed cash movement: negative for buys, positive for sells, zero
    /// for rejections. Sums to (cash - initial_capital) across the log.
    pub cash_delta: f64,
    /// Realized PnL net of fees — sells only.
    pub realized_pnl: Option<f64>,
    /// Realized PnL as a fraction of consumed cost basis — sells only.
    pub realized_pnl_pct: Option<f64>,
    /// Calendar days from the earliest consumed lot to the sale — sells only.
    pub hold_days: Option<i64>,
    /// Stop that forced the sale; None for signal-originated trades.
    pub stop_kind: Option<StopKind>,
}

impl TradeRecord {
    pub fn is_fill(&self) -> bool {
        matches!(self.status, TradeStatus::Filled)
    }

    /// A completed (filled) sale — the unit of realized-return resampling.
    pub fn is_closed_sale(&self) -> bool {
        self.is_fill() && self.side == OrderSide::Sell
    }

    /// Build a no-fill record from a rejected order.
    pub fn rejected(
        symbol: impl Into<String>,
        date: NaiveDate,
        side: OrderSide,
        reason: OrderReject,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            side,
            status: TradeStatus::Rejected(reason),
            quantity: 0,
            price: 0.0,
            commission: 0.0,
            stamp_tax: 0.0,
            cash_delta: 0.0,
            realized_pnl: None,
            realized_pnl_pct: None,
            hold_days: None,
            stop_kind: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_record_moves_no_cash() {
        let rec = TradeRecord::rejected(
            "600519",
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            OrderSide::Buy,
            OrderReject::InsufficientCash {
                required: 10_000.0,
                available: 5_000.0,
            },
        );
        assert!(!rec.is_fill());
        assert_eq!(rec.quantity, 0);
        assert_eq!(rec.cash_delta, 0.0);
    }

    #[test]
    fn stop_kind_labels() {
        assert_eq!(StopKind::Hard.as_str(), "hard_stop");
        assert_eq!(StopKind::Drawdown.as_str(), "drawdown_halt");
    }

    #[test]
    fn trade_serialization_roundtrip() {
        let rec = TradeRecord {
            symbol: "300750".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 6).unwrap(),
            side: OrderSide::Sell,
            status: TradeStatus::Filled,
            quantity: 400,
            price: 55.0,
            commission: 5.5,
            stamp_tax: 22.0,
            cash_delta: 21_972.5,
            realized_pnl: 1_972.5.into(),
            realized_pnl_pct: 0.0986.into(),
            hold_days: Some(1),
            stop_kind: Some(StopKind::Trailing),
        };
        let json = serde_json::to_string(&rec).unwrap();
        let deser: TradeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(rec, deser);
    }
}
