//! Price-limit bands — the exchange's maximum daily move, board-dependent.
//!
//! Board classification is derived from the symbol code: ChiNext (300xxx)
//! and STAR Market (688xxx) codes trade in a ±20% band, ST stocks in ±5%,
//! everything else on the main boards in ±10%. Band bounds are rounded to
//! the exchange's 2-decimal tick, matching published limit prices.

use crate::domain::OrderReject;
use serde::{Deserialize, Serialize};

/// Exchange board, as far as price limits are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Board {
    /// Main boards (Shanghai/Shenzhen): ±10%.
    Standard,
    /// ChiNext (300) and STAR Market (688): ±20%.
    Restricted,
    /// Special treatment: ±5%.
    SpecialTreatment,
}

impl Board {
    /// Classify a symbol code. The ST flag wins over the code prefix.
    pub fn classify(symbol: &str, is_st: bool) -> Self {
        if is_st {
            Board::SpecialTreatment
        } else if symbol.starts_with("300") || symbol.starts_with("688") {
            Board::Restricted
        } else {
            Board::Standard
        }
    }

    pub fn limit_pct(self) -> f64 {
        match self {
            Board::Standard => 0.10,
            Board::Restricted => 0.20,
            Board::SpecialTreatment => 0.05,
        }
    }
}

/// The allowed trading range for one bar: [floor, ceiling], inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBand {
    pub floor: f64,
    pub ceiling: f64,
}

impl PriceBand {
    /// Validate a requested execution price against the band.
    ///
    /// A price exactly on either boundary is allowed; anything outside
    /// fails with `PriceLimitBreached` and the order is unfillable this bar.
    pub fn clip(&self, price: f64) -> Result<f64, OrderReject> {
        if price < self.floor || price > self.ceiling {
            return Err(OrderReject::PriceLimitBreached {
                price,
                floor: self.floor,
                ceiling: self.ceiling,
            });
        }
        Ok(price)
    }
}

/// Compute the allowed range for the current bar from the prior close.
pub fn allowed_range(symbol: &str, prev_close: f64, is_st: bool) -> PriceBand {
    let pct = Board::classify(symbol, is_st).limit_pct();
    PriceBand {
        floor: round_tick(prev_close * (1.0 - pct)),
        ceiling: round_tick(prev_close * (1.0 + pct)),
    }
}

/// Round to the 0.01 price tick.
pub(crate) fn round_tick(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}
