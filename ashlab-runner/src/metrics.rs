//! Performance metrics — pure functions that compute run statistics.
//!
//! Every metric is a pure function: equity values and/or closed trades in,
//! scalar out. Benchmark-relative statistics come from the parallel
//! benchmark series the engine records on the equity curve.

use ashlab_core::domain::TradeRecord;
use ashlab_core::engine::RunResult;
use serde::{Deserialize, Serialize};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Aggregate performance metrics for a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub annual_return: f64,
    pub annual_volatility: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub calmar: f64,
    pub max_drawdown: f64,
    /// Bars from the drawdown peak to the trough.
    pub max_drawdown_duration: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub trade_count: usize,
    pub benchmark: Option<BenchmarkComparison>,
}

/// Benchmark-relative statistics from daily-return regression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkComparison {
    pub benchmark_return: f64,
    pub excess_return: f64,
    pub alpha: f64,
    pub beta: f64,
    pub information_ratio: f64,
}

impl PerformanceMetrics {
    /// Compute all metrics from a run result.
    pub fn from_run(result: &RunResult) -> Self {
        let equity = result.equity_values();
        let benchmark = result.benchmark_values();
        let closed: Vec<&TradeRecord> = result.closed_sales().collect();
        Self::compute(&equity, Some(&benchmark), &closed)
    }

    /// Compute from raw series; `benchmark` is a parallel equity series.
    pub fn compute(
        equity: &[f64],
        benchmark: Option<&[f64]>,
        closed_trades: &[&TradeRecord],
    ) -> Self {
        let (max_dd, dd_duration) = max_drawdown(equity);
        let pnls: Vec<f64> = closed_trades
            .iter()
            .filter_map(|t| t.realized_pnl)
            .collect();
        Self {
            total_return: total_return(equity),
            annual_return: annual_return(equity),
            annual_volatility: annual_volatility(equity),
            sharpe: sharpe_ratio(equity),
            sortino: sortino_ratio(equity),
            calmar: calmar_ratio(equity),
            max_drawdown: max_dd,
            max_drawdown_duration: dd_duration,
            win_rate: win_rate(&pnls),
            profit_factor: profit_factor(&pnls),
            avg_win: avg_win(&pnls),
            avg_loss: avg_loss(&pnls),
            trade_count: closed_trades.len(),
            benchmark: benchmark
                .filter(|b| b.len() == equity.len() && b.len() >= 2)
                .map(|b| benchmark_comparison(equity, b)),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(equity: &[f64]) -> f64 {
    if equity.len() < 2 || equity[0] <= 0.0 {
        return 0.0;
    }
    equity.last().unwrap() / equity[0] - 1.0
}

/// Annualized return assuming 252 trading days.
pub fn annual_return(equity: &[f64]) -> f64 {
    let n = equity.len();
    if n < 2 || equity[0] <= 0.0 || *equity.last().unwrap() <= 0.0 {
        return 0.0;
    }
    let years = n as f64 / TRADING_DAYS_PER_YEAR;
    (equity.last().unwrap() / equity[0]).powf(1.0 / years) - 1.0
}

/// Annualized volatility of daily returns.
pub fn annual_volatility(equity: &[f64]) -> f64 {
    let returns = daily_returns(equity);
    std_dev(&returns) * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Annualized Sharpe ratio (zero risk-free rate). 0.0 when variance is zero.
pub fn sharpe_ratio(equity: &[f64]) -> f64 {
    let returns = daily_returns(equity);
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    mean(&returns) / std * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Annualized Sortino ratio (downside deviation only).
pub fn sortino_ratio(equity: &[f64]) -> f64 {
    let returns = daily_returns(equity);
    if returns.len() < 2 {
        return 0.0;
    }
    let downside_sq: Vec<f64> = returns.iter().filter(|&&r| r < 0.0).map(|r| r * r).collect();
    if downside_sq.is_empty() {
        return 0.0;
    }
    let downside_std =
        (downside_sq.iter().sum::<f64>() / returns.len() as f64).sqrt();
    if downside_std < 1e-15 {
        return 0.0;
    }
    mean(&returns) / downside_std * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Calmar ratio: annual return / |max drawdown|.
pub fn calmar_ratio(equity: &[f64]) -> f64 {
    let (dd, _) = max_drawdown(equity);
    let ar = annual_return(equity);
    if dd >= 0.0 || ar <= 0.0 {
        return 0.0;
    }
    ar / dd.abs()
}

/// Maximum drawdown as a negative fraction, plus its duration in bars
/// (peak to trough).
pub fn max_drawdown(equity: &[f64]) -> (f64, usize) {
    let mut peak = f64::MIN;
    let mut peak_index = 0usize;
    let mut max_dd = 0.0_f64;
    let mut duration = 0usize;

    for (i, &eq) in equity.iter().enumerate() {
        if eq > peak {
            peak = eq;
            peak_index = i;
        }
        if peak > 0.0 {
            let dd = (eq - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
                duration = i - peak_index;
            }
        }
    }
    (max_dd, duration)
}

/// Fraction of closed trades with positive realized PnL.
pub fn win_rate(pnls: &[f64]) -> f64 {
    if pnls.is_empty() {
        return 0.0;
    }
    pnls.iter().filter(|&&p| p > 0.0).count() as f64 / pnls.len() as f64
}

/// Gross profits / gross losses, capped at 100.
pub fn profit_factor(pnls: &[f64]) -> f64 {
    let gross_profit: f64 = pnls.iter().filter(|&&p| p > 0.0).sum();
    let gross_loss: f64 = pnls.iter().filter(|&&p| p < 0.0).map(|p| p.abs()).sum();
    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

pub fn avg_win(pnls: &[f64]) -> f64 {
    let wins: Vec<f64> = pnls.iter().copied().filter(|&p| p > 0.0).collect();
    mean(&wins)
}

pub fn avg_loss(pnls: &[f64]) -> f64 {
    let losses: Vec<f64> = pnls.iter().copied().filter(|&p| p < 0.0).collect();
    mean(&losses)
}

fn benchmark_comparison(equity: &[f64], benchmark: &[f64]) -> BenchmarkComparison {
    let strat_returns = daily_returns(equity);
    let bench_returns = daily_returns(benchmark);
    let n = strat_returns.len().min(bench_returns.len());
    let strat_returns = &strat_returns[..n];
    let bench_returns = &bench_returns[..n];

    let beta = regression_beta(strat_returns, bench_returns);
    let strat_annual = annual_return(equity);
    let bench_annual = annual_return(benchmark);
    let alpha = strat_annual - beta * bench_annual;

    let active: Vec<f64> = strat_returns
        .iter()
        .zip(bench_returns)
        .map(|(s, b)| s - b)
        .collect();
    let tracking_error = std_dev(&active) * TRADING_DAYS_PER_YEAR.sqrt();
    let information_ratio = if tracking_error < 1e-15 {
        0.0
    } else {
        mean(&active) * TRADING_DAYS_PER_YEAR / tracking_error
    };

    BenchmarkComparison {
        benchmark_return: total_return(benchmark),
        excess_return: total_return(equity) - total_return(benchmark),
        alpha,
        beta,
        information_ratio,
    }
}

/// OLS beta of strategy returns on benchmark returns.
fn regression_beta(strat: &[f64], bench: &[f64]) -> f64 {
    if strat.len() < 2 {
        return 0.0;
    }
    let mean_s = mean(strat);
    let mean_b = mean(bench);
    let mut cov = 0.0;
    let mut var = 0.0;
    for (s, b) in strat.iter().zip(bench) {
        cov += (s - mean_s) * (b - mean_b);
        var += (b - mean_b) * (b - mean_b);
    }
    if var < 1e-15 {
        return 0.0;
    }
    cov / var
}

// ─── Helpers ────────────────────────────────────────────────────────

pub fn daily_returns(equity: &[f64]) -> Vec<f64> {
    if equity.len() < 2 {
        return Vec::new();
    }
    equity
        .windows(2)
        .map(|w| if w[0] > 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64).sqrt()
}
