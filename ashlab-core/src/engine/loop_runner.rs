//! Bar-by-bar event loop — the heart of the simulation.
//!
//! Four steps per bar:
//! 1. Mark positions to the bar close; update per-symbol peaks and the
//!    account peak (drawdown check — may flip the sticky halt).
//! 2. Risk pass: stop chain per open position, drawdown liquidation while
//!    halted; forced exits go to the broker (rejections defer to the next
//!    bar).
//! 3. Signal pass (skipped while halted): pull strategy signals, scale buy
//!    notional by the regime filter, submit to the broker.
//! 4. Append the equity curve point.
//!
//! Strictly sequential: each bar depends on the account state left by the
//! previous one. No positions are liquidated at the end; final equity is
//! mark-to-market.

use crate::broker::SimBroker;
use crate::config::{ConfigError, RunConfig};
use crate::domain::{AccountState, Order, TradeRecord};
use crate::engine::data::MarketData;
use crate::engine::result::{EquityPoint, RunResult};
use crate::fingerprint::RunFingerprint;
use crate::regime::RegimeFilter;
use crate::risk::{RiskManager, StopContext};
use crate::signals::{BarContext, SignalKind, Strategy};
use chrono::NaiveDate;
use std::collections::HashMap;
use thiserror::Error;

/// Irrecoverable engine failures. Per-order conditions never show up here;
/// they are rejected no-fill entries in the trade log.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Run one backtest over `data` with `strategy` under `config`.
///
/// Deterministic: identical data, strategy state, and configuration produce
/// byte-identical trade logs and equity curves.
pub fn run_backtest(
    data: &MarketData,
    strategy: &mut dyn Strategy,
    config: &RunConfig,
) -> Result<RunResult, EngineError> {
    config.validate()?;

    let mut broker = SimBroker::new(config);
    let mut risk = RiskManager::new(config);
    let regime = RegimeFilter::new(config.regime.clone(), data.benchmark_closes());

    let num_bars = data.num_bars();
    let bench = data.benchmark_closes();
    let bench_base = bench.first().copied().unwrap_or(1.0);

    let mut equity_curve: Vec<EquityPoint> = Vec::with_capacity(num_bars);
    let mut last_close: HashMap<String, f64> = HashMap::new();
    let mut halt_date: Option<NaiveDate> = None;

    for t in 0..num_bars {
        let date = data.dates()[t];

        // Closes traded on this bar; carry marks forward for the rest.
        let mut closes: HashMap<String, f64> = HashMap::new();
        for symbol in data.symbols() {
            if let Some(bar) = data.bar(symbol, t) {
                closes.insert(symbol.clone(), bar.close);
                last_close.insert(symbol.clone(), bar.close);
            }
        }

        // ── 1. Mark-to-market ──
        broker.update_peaks(&closes);
        let equity = broker.equity(&last_close);
        let status = risk.observe_equity(equity);
        if status.halted && halt_date.is_none() {
            halt_date = Some(date);
            log::warn!(
                "drawdown ceiling breached on {date}: drawdown {:.1}%, trading halted",
                status.drawdown * 100.0
            );
        }

        // ── 2. Risk pass ──
        for position in broker.positions(date) {
            let Some(bar) = data.bar(&position.symbol, t) else {
                continue;
            };
            // T+1: a position with nothing sellable cannot exit today;
            // the stop re-fires on the next bar.
            if position.sellable == 0 {
                continue;
            }
            let bars_held = t.saturating_sub(data.index_at_or_after(position.entry_date));
            let ctx = StopContext {
                position: &position,
                close: bar.close,
                bars_held,
                risk_inputs: data.risk_inputs(&position.symbol, t),
            };
            if let Some(kind) = risk.check_position(&ctx) {
                let order = Order::forced_exit(&position.symbol, position.quantity, date, kind);
                // Rejections are recorded by the broker; the stop defers.
                let _ = broker.execute(&order, bar);
            }
        }

        // ── 3. Signal pass ──
        if !risk.trading_halted() {
            let positions = broker.positions(date);
            let ctx = BarContext {
                bar_index: t,
                date,
                data,
                equity: broker.equity(&last_close),
                cash: broker.cash(),
                positions: &positions,
                drawdown: status.drawdown,
            };
            let events = strategy.on_bar(&ctx);
            for event in events {
                let Some(bar) = data.bar(&event.symbol, t) else {
                    continue;
                };
                match event.kind {
                    SignalKind::Buy { notional } => {
                        let scaled = notional * regime.exposure(t, bench[t]);
                        if scaled > 0.0 {
                            let order = Order::signal_buy(&event.symbol, scaled, date);
                            let _ = broker.execute(&order, bar);
                        }
                    }
                    SignalKind::Sell { quantity } => {
                        if quantity > 0 {
                            let order = Order::signal_sell(&event.symbol, quantity, date);
                            let _ = broker.execute(&order, bar);
                        }
                    }
                    SignalKind::Hold => {}
                }
            }
        }

        // ── 4. Equity point ──
        equity_curve.push(EquityPoint {
            date,
            equity: broker.equity(&last_close),
            benchmark_equity: bench[t] / bench_base * config.initial_capital,
            trade_count: broker.fill_count(),
        });
    }

    let final_equity = equity_curve
        .last()
        .map(|p| p.equity)
        .unwrap_or(config.initial_capital);
    let fill_count = broker.fill_count();
    let account = AccountState {
        cash: broker.cash(),
        equity: final_equity,
        peak_equity: risk.peak_equity(),
        trading_halted: risk.trading_halted(),
    };
    let trades: Vec<TradeRecord> = broker.into_trades();
    let reject_count = trades.len() - fill_count;
    let fingerprint = RunFingerprint::compute(&trades, &equity_curve);

    log::info!(
        "run complete: {num_bars} bars, {fill_count} fills, {reject_count} rejects, final equity {final_equity:.2}"
    );

    Ok(RunResult {
        equity_curve,
        trades,
        account,
        final_equity,
        fill_count,
        reject_count,
        halt_date,
        fingerprint,
    })
}
