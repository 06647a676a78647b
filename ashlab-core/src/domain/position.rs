//! Position — a per-symbol view derived from open lots.
//!
//! Positions are not persisted truth: the lot ledger is. This view is
//! rebuilt at each bar boundary so the aggregate quantity always equals the
//! sum of lot quantities.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Aggregate view of one symbol's open lots at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionView {
    pub symbol: String,
    /// Total shares across all open lots.
    pub quantity: u64,
    /// Shares sellable today under T+1.
    pub sellable: u64,
    /// Quantity-weighted average cost per share.
    pub avg_cost: f64,
    /// Acquisition date of the earliest open lot (time-stop reference).
    pub entry_date: NaiveDate,
    /// Highest close observed since entry (trailing-stop reference).
    pub peak_price: f64,
}

impl PositionView {
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.avg_cost) * self.quantity as f64
    }

    /// Unrealized return as a fraction of cost; zero for a zero-cost view.
    pub fn unrealized_pct(&self, price: f64) -> f64 {
        if self.avg_cost <= 0.0 {
            return 0.0;
        }
        (price - self.avg_cost) / self.avg_cost
    }
}
