//! Layered risk controls: per-position stop chain + account drawdown ceiling.

pub mod drawdown;
pub mod stops;

pub use drawdown::{DrawdownGuard, DrawdownStatus};
pub use stops::{
    default_chain, evaluate_chain, RiskInputs, StopConfig, StopContext, StopRule,
};

use crate::config::RunConfig;
use crate::domain::StopKind;

/// Per-run risk manager: owns the stop chain and the drawdown guard.
pub struct RiskManager {
    chain: Vec<Box<dyn StopRule>>,
    guard: DrawdownGuard,
}

impl RiskManager {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            chain: default_chain(&config.stops),
            guard: DrawdownGuard::new(config.initial_capital, config.max_drawdown_pct),
        }
    }

    /// Evaluate the stop chain for one open position. At most one stop kind
    /// is returned per position per bar; while halted every position is a
    /// drawdown liquidation regardless of the chain.
    pub fn check_position(&self, ctx: &StopContext<'_>) -> Option<StopKind> {
        if self.guard.halted() {
            return Some(StopKind::Drawdown);
        }
        evaluate_chain(&self.chain, ctx)
    }

    /// Record the bar's equity; may flip the sticky halt.
    pub fn observe_equity(&mut self, equity: f64) -> DrawdownStatus {
        self.guard.observe(equity)
    }

    pub fn trading_halted(&self) -> bool {
        self.guard.halted()
    }

    pub fn peak_equity(&self) -> f64 {
        self.guard.peak_equity()
    }
}
