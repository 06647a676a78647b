//! Lot — a discrete batch of shares acquired at one time.
//!
//! Lots are the unit of T+1 settlement tracking: shares bought on day D are
//! sellable only on bar dates strictly after D. A position is the sum of its
//! open lots; sales consume lots oldest-first (FIFO).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One purchase lot: quantity, per-share cost basis, acquisition date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    pub quantity: u64,
    /// Cost basis per share (fill price at acquisition, post-slippage).
    pub cost_basis: f64,
    pub acquired: NaiveDate,
}

impl Lot {
    pub fn new(quantity: u64, cost_basis: f64, acquired: NaiveDate) -> Self {
        Self {
            quantity,
            cost_basis,
            acquired,
        }
    }

    /// Sellable quantity on `date` under the T+1 rule: the full lot once the
    /// bar date is strictly after the acquisition date, zero before that.
    /// Monotonic — once sellable a lot never reverts.
    pub fn sellable_on(&self, date: NaiveDate) -> u64 {
        if date > self.acquired {
            self.quantity
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn same_day_not_sellable() {
        let lot = Lot::new(500, 10.0, d(5));
        assert_eq!(lot.sellable_on(d(5)), 0);
    }

    #[test]
    fn next_day_fully_sellable() {
        let lot = Lot::new(500, 10.0, d(5));
        assert_eq!(lot.sellable_on(d(6)), 500);
        assert_eq!(lot.sellable_on(d(20)), 500);
    }

    #[test]
    fn earlier_date_not_sellable() {
        let lot = Lot::new(500, 10.0, d(5));
        assert_eq!(lot.sellable_on(d(4)), 0);
    }
}
