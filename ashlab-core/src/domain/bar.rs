//! Bar — the fundamental market data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single symbol on a single day.
///
/// Bars arrive already split/dividend-adjusted and gap-checked by the data
/// pipeline upstream. `prev_close` carries the prior adjusted close, which the
/// price-band validator uses to compute the day's allowed trading range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    /// Prior adjusted close; 0.0 on the first bar of a series (no band check).
    pub prev_close: f64,
    /// Special-treatment flag (ST stocks trade in a ±5% band).
    #[serde(default)]
    pub is_st: bool,
}

impl Bar {
    /// Basic OHLC sanity check: high >= low, high/low bracket open and close,
    /// prices strictly positive.
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
            && self.low > 0.0
    }
}
