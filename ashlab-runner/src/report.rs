//! Result artifacts — trade-log CSV, equity-curve CSV, JSON summary.

use anyhow::{Context, Result};
use ashlab_core::domain::{OrderSide, TradeRecord, TradeStatus};
use ashlab_core::engine::{EquityPoint, RunResult};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::metrics::PerformanceMetrics;

/// Write the full audit ledger, rejections included.
pub fn write_trades_csv(path: &Path, trades: &[TradeRecord]) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("failed to create trades CSV {}", path.display()))?;

    writeln!(
        file,
        "date,symbol,side,status,quantity,price,commission,stamp_tax,cash_delta,\
         realized_pnl,realized_pnl_pct,hold_days,stop_kind"
    )?;
    for trade in trades {
        let side = match trade.side {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        };
        let status = match &trade.status {
            TradeStatus::Filled => "filled".to_string(),
            TradeStatus::Rejected(reason) => format!("rejected: {reason}"),
        };
        writeln!(
            file,
            "{},{},{},\"{}\",{},{:.2},{:.2},{:.2},{:.2},{},{},{},{}",
            trade.date,
            trade.symbol,
            side,
            status,
            trade.quantity,
            trade.price,
            trade.commission,
            trade.stamp_tax,
            trade.cash_delta,
            trade
                .realized_pnl
                .map(|v| format!("{v:.2}"))
                .unwrap_or_default(),
            trade
                .realized_pnl_pct
                .map(|v| format!("{v:.4}"))
                .unwrap_or_default(),
            trade.hold_days.map(|v| v.to_string()).unwrap_or_default(),
            trade.stop_kind.map(|k| k.as_str()).unwrap_or(""),
        )?;
    }
    Ok(())
}

/// Write the equity curve with the parallel benchmark series.
pub fn write_equity_csv(path: &Path, curve: &[EquityPoint]) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("failed to create equity CSV {}", path.display()))?;

    writeln!(file, "date,equity,benchmark_equity,trade_count")?;
    for point in curve {
        writeln!(
            file,
            "{},{:.2},{:.2},{}",
            point.date, point.equity, point.benchmark_equity, point.trade_count
        )?;
    }
    Ok(())
}

/// Everything downstream reporting needs in one JSON document.
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub metrics: &'a PerformanceMetrics,
    pub final_equity: f64,
    pub fill_count: usize,
    pub reject_count: usize,
    pub trading_halted: bool,
    pub halt_date: Option<chrono::NaiveDate>,
    pub trades_hash: &'a str,
    pub equity_hash: &'a str,
}

pub fn write_summary_json(
    path: &Path,
    result: &RunResult,
    metrics: &PerformanceMetrics,
) -> Result<()> {
    let summary = RunSummary {
        metrics,
        final_equity: result.final_equity,
        fill_count: result.fill_count,
        reject_count: result.reject_count,
        trading_halted: result.account.trading_halted,
        halt_date: result.halt_date,
        trades_hash: &result.fingerprint.trades_hash,
        equity_hash: &result.fingerprint.equity_hash,
    };
    let json = serde_json::to_string_pretty(&summary).context("failed to serialize summary")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write summary JSON {}", path.display()))?;
    Ok(())
}

/// Write all artifacts for one run into `out_dir`.
pub fn save_artifacts(
    out_dir: &Path,
    result: &RunResult,
    metrics: &PerformanceMetrics,
) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output dir {}", out_dir.display()))?;
    write_trades_csv(&out_dir.join("trades.csv"), &result.trades)?;
    write_equity_csv(&out_dir.join("equity.csv"), &result.equity_curve)?;
    write_summary_json(&out_dir.join("summary.json"), result, metrics)?;
    log::info!("artifacts written to {}", out_dir.display());
    Ok(())
}
