//! Strategy boundary — the engine depends only on the `Strategy` trait.
//!
//! For each bar a strategy yields at most one signal per symbol:
//! buy (notional), sell (quantity), or hold. The confidence score is
//! advisory metadata for reporting; engine logic never consumes it.

pub mod momentum;
pub mod scripted;

pub use momentum::Momentum;
pub use scripted::Scripted;

use crate::domain::PositionView;
use crate::engine::data::MarketData;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SignalKind {
    /// Buy up to this cash notional (scaled by the regime filter before it
    /// reaches the broker, then floored to whole board lots).
    Buy { notional: f64 },
    /// Sell an explicit share count.
    Sell { quantity: u64 },
    Hold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub symbol: String,
    pub kind: SignalKind,
    /// Advisory only; not consumed by engine logic.
    pub confidence: f64,
}

/// Everything a strategy may look at on one bar. History access goes
/// through `data` and is bounded by `bar_index` by convention; the
/// engine supplies the same full series every bar.
pub struct BarContext<'a> {
    pub bar_index: usize,
    pub date: NaiveDate,
    pub data: &'a MarketData,
    pub equity: f64,
    pub cash: f64,
    pub positions: &'a [PositionView],
    /// Current account drawdown from peak.
    pub drawdown: f64,
}

impl BarContext<'_> {
    pub fn position(&self, symbol: &str) -> Option<&PositionView> {
        self.positions.iter().find(|p| p.symbol == symbol)
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.position(symbol).is_some()
    }
}

/// A signal-producing strategy variant.
///
/// `optimize` is the walk-forward hook: it receives the training slice and
/// may retune parameters before the out-of-sample run. The default is a
/// no-op for parameterless strategies.
pub trait Strategy: Send {
    fn name(&self) -> &str;

    fn on_bar(&mut self, ctx: &BarContext<'_>) -> Vec<SignalEvent>;

    fn optimize(&mut self, _train: &MarketData) {}
}
