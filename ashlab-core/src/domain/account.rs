//! Account state — cash, mark-to-market equity, peak, halt flag.

use serde::{Deserialize, Serialize};

/// Snapshot of the account at a bar boundary.
///
/// `trading_halted` is a valid terminal policy state, not an error: once the
/// drawdown ceiling is breached it stays set for the remainder of the run
/// and suppresses all new buy orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    pub cash: f64,
    pub equity: f64,
    pub peak_equity: f64,
    pub trading_halted: bool,
}

impl AccountState {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            cash: initial_capital,
            equity: initial_capital,
            peak_equity: initial_capital,
            trading_halted: false,
        }
    }

    /// Drawdown from peak as a positive fraction (0.0 when at the peak).
    pub fn drawdown(&self) -> f64 {
        if self.peak_equity <= 0.0 {
            return 0.0;
        }
        (self.peak_equity - self.equity) / self.peak_equity
    }
}
