//! Run results: the equity curve and the final account snapshot.

use crate::domain::{AccountState, TradeRecord};
use crate::fingerprint::RunFingerprint;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One point per simulated bar; append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
    /// Benchmark close normalized to the starting capital.
    pub benchmark_equity: f64,
    /// Cumulative fill count up to and including this bar.
    pub trade_count: usize,
}

/// Result of a complete backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub equity_curve: Vec<EquityPoint>,
    /// Full audit ledger: fills and rejected no-fill events, in order.
    pub trades: Vec<TradeRecord>,
    pub account: AccountState,
    pub final_equity: f64,
    pub fill_count: usize,
    pub reject_count: usize,
    /// Bar date on which the drawdown ceiling halted trading, if it did.
    pub halt_date: Option<NaiveDate>,
    /// Content hash of the trade log + equity curve, for replay validation.
    pub fingerprint: RunFingerprint,
}

impl RunResult {
    /// Completed sales — the unit of Monte Carlo resampling.
    pub fn closed_sales(&self) -> impl Iterator<Item = &TradeRecord> {
        self.trades.iter().filter(|t| t.is_closed_sale())
    }

    /// Equity values only, for metric functions.
    pub fn equity_values(&self) -> Vec<f64> {
        self.equity_curve.iter().map(|p| p.equity).collect()
    }

    pub fn benchmark_values(&self) -> Vec<f64> {
        self.equity_curve.iter().map(|p| p.benchmark_equity).collect()
    }
}
