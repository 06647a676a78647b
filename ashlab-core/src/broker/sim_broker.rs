//! Simulated broker — executes orders against bar data.
//!
//! The broker owns the cash balance, the lot ledger, and the trade log.
//! Every order resolves to exactly one appended `TradeRecord`: a fill with
//! the money movement, or a rejection recorded as a no-fill event. Side
//! effects never leave the broker's own state.
//!
//! Execution rules:
//! - fill price = bar open or close (per `ExecTiming`), slippage always
//!   adverse to the trader, capped into the bar's [low, high] range;
//! - the price-band validator runs before any fill;
//! - buys require notional + commission <= cash, never a partial fill;
//! - signal sells exceeding the sellable quantity are rejected outright,
//!   forced exits are clamped to the sellable quantity (T+1 can still defer
//!   same-day shares to the next bar).

use super::ledger::LotLedger;
use super::price_band::{allowed_range, round_tick};
use crate::config::{CostConfig, ExecTiming, RunConfig};
use crate::domain::{
    Bar, Order, OrderReject, OrderSide, OrderSize, OrderSource, PositionView, TradeRecord,
    TradeStatus,
};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Shares per board lot; all orders trade in whole lots.
pub const BOARD_LOT: u64 = 100;

pub struct SimBroker {
    initial_capital: f64,
    cash: f64,
    ledger: LotLedger,
    /// Highest close observed since entry, per held symbol.
    peaks: HashMap<String, f64>,
    trades: Vec<TradeRecord>,
    fill_count: usize,
    costs: CostConfig,
    timing: ExecTiming,
}

impl SimBroker {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            initial_capital: config.initial_capital,
            cash: config.initial_capital,
            ledger: LotLedger::new(),
            peaks: HashMap::new(),
            trades: Vec::new(),
            fill_count: 0,
            costs: config.costs.clone(),
            timing: config.timing,
        }
    }

    // ── Order execution ────────────────────────────────────────────────

    /// Execute one order against the bar's price data.
    ///
    /// Returns the appended record on fill; on rejection the reason is both
    /// returned and recorded in the trade log as a no-fill entry.
    pub fn execute(&mut self, order: &Order, bar: &Bar) -> Result<TradeRecord, OrderReject> {
        if order.symbol != bar.symbol {
            return self.reject(
                order,
                OrderReject::InvalidOrder(format!(
                    "order symbol {} does not match bar symbol {}",
                    order.symbol, bar.symbol
                )),
            );
        }

        let fill_price = self.fill_price(order.side, bar);

        // Price band first: a breach makes the order unfillable this bar.
        if bar.prev_close > 0.0 {
            let band = allowed_range(&bar.symbol, bar.prev_close, bar.is_st);
            if let Err(reason) = band.clip(fill_price) {
                return self.reject(order, reason);
            }
        }

        match order.side {
            OrderSide::Buy => self.execute_buy(order, bar, fill_price),
            OrderSide::Sell => self.execute_sell(order, bar, fill_price),
        }
    }

    fn execute_buy(
        &mut self,
        order: &Order,
        bar: &Bar,
        price: f64,
    ) -> Result<TradeRecord, OrderReject> {
        let quantity = match order.size {
            OrderSize::Shares(q) => {
                if q == 0 || q % BOARD_LOT != 0 {
                    return self.reject(
                        order,
                        OrderReject::InvalidOrder(format!(
                            "buy quantity must be a positive multiple of {BOARD_LOT}, got {q}"
                        )),
                    );
                }
                q
            }
            OrderSize::Notional(n) => {
                if n <= 0.0 || !n.is_finite() {
                    return self.reject(
                        order,
                        OrderReject::InvalidOrder(format!("non-positive buy notional {n}")),
                    );
                }
                let lots = (n / price / BOARD_LOT as f64).floor() as u64;
                if lots == 0 {
                    return self.reject(
                        order,
                        OrderReject::InvalidOrder(format!(
                            "notional {n:.2} buys less than one board lot at {price:.2}"
                        )),
                    );
                }
                lots * BOARD_LOT
            }
        };

        let notional = price * quantity as f64;
        let commission = self.commission(notional, OrderSide::Buy);
        let required = notional + commission;
        if required > self.cash {
            return self.reject(
                order,
                OrderReject::InsufficientCash {
                    required,
                    available: self.cash,
                },
            );
        }

        self.cash -= required;
        self.ledger.acquire(&bar.symbol, bar.date, quantity, price);
        self.peaks
            .entry(bar.symbol.clone())
            .and_modify(|p| *p = p.max(price))
            .or_insert(price);

        let record = TradeRecord {
            symbol: bar.symbol.clone(),
            date: bar.date,
            side: OrderSide::Buy,
            status: TradeStatus::Filled,
            quantity,
            price,
            commission,
            stamp_tax: 0.0,
            cash_delta: -required,
            realized_pnl: None,
            realized_pnl_pct: None,
            hold_days: None,
            stop_kind: None,
        };
        self.fill_count += 1;
        self.trades.push(record.clone());
        Ok(record)
    }

    fn execute_sell(
        &mut self,
        order: &Order,
        bar: &Bar,
        price: f64,
    ) -> Result<TradeRecord, OrderReject> {
        let requested = match order.size {
            OrderSize::Shares(q) => q,
            OrderSize::Notional(n) => {
                return self.reject(
                    order,
                    OrderReject::InvalidOrder(format!(
                        "sell orders must be share-denominated, got notional {n:.2}"
                    )),
                );
            }
        };
        if requested == 0 {
            return self.reject(
                order,
                OrderReject::InvalidOrder("zero sell quantity".to_string()),
            );
        }
        if order.source == OrderSource::Signal && requested % BOARD_LOT != 0 {
            return self.reject(
                order,
                OrderReject::InvalidOrder(format!(
                    "sell quantity must be a multiple of {BOARD_LOT}, got {requested}"
                )),
            );
        }

        let sellable = self.ledger.sellable_quantity(&bar.symbol, bar.date);
        let quantity = if order.is_forced() {
            // Forced exits liquidate what T+1 allows; the remainder defers.
            requested.min(sellable)
        } else if requested > sellable {
            return self.reject(
                order,
                OrderReject::InsufficientSellableShares {
                    requested,
                    sellable,
                },
            );
        } else {
            requested
        };
        if quantity == 0 {
            return self.reject(
                order,
                OrderReject::InsufficientSellableShares {
                    requested,
                    sellable,
                },
            );
        }

        let consumed = match self.ledger.consume(&bar.symbol, quantity, bar.date) {
            Ok(c) => c,
            Err(reason) => return self.reject(order, reason),
        };

        let notional = price * quantity as f64;
        let commission = self.commission(notional, OrderSide::Sell);
        let stamp_tax = notional * self.costs.stamp_tax_rate;
        let proceeds = notional - commission - stamp_tax;
        self.cash += proceeds;

        let realized_pnl = notional - consumed.cost_basis - commission - stamp_tax;
        let realized_pnl_pct = if consumed.cost_basis > 0.0 {
            realized_pnl / consumed.cost_basis
        } else {
            0.0
        };
        let hold_days = (bar.date - consumed.earliest_acquired).num_days();

        if self.ledger.total_quantity(&bar.symbol) == 0 {
            self.peaks.remove(&bar.symbol);
        }

        let record = TradeRecord {
            symbol: bar.symbol.clone(),
            date: bar.date,
            side: OrderSide::Sell,
            status: TradeStatus::Filled,
            quantity,
            price,
            commission,
            stamp_tax,
            cash_delta: proceeds,
            realized_pnl: Some(realized_pnl),
            realized_pnl_pct: Some(realized_pnl_pct),
            hold_days: Some(hold_days),
            stop_kind: order.stop_kind(),
        };
        self.fill_count += 1;
        self.trades.push(record.clone());
        Ok(record)
    }

    fn reject(&mut self, order: &Order, reason: OrderReject) -> Result<TradeRecord, OrderReject> {
        log::debug!(
            "rejected {:?} {} on {}: {reason}",
            order.side,
            order.symbol,
            order.date
        );
        self.trades.push(TradeRecord::rejected(
            order.symbol.clone(),
            order.date,
            order.side,
            reason.clone(),
        ));
        Err(reason)
    }

    /// Execution price: timing anchor, adverse slippage, capped into the
    /// bar's traded range, rounded to the price tick.
    fn fill_price(&self, side: OrderSide, bar: &Bar) -> f64 {
        let base = match self.timing {
            ExecTiming::Open => bar.open,
            ExecTiming::Close => bar.close,
        };
        let raw = match side {
            OrderSide::Buy => (base * (1.0 + self.costs.slippage_rate)).min(bar.high),
            OrderSide::Sell => (base * (1.0 - self.costs.slippage_rate)).max(bar.low),
        };
        round_tick(raw)
    }

    fn commission(&self, notional: f64, side: OrderSide) -> f64 {
        let rate = match side {
            OrderSide::Buy => self.costs.commission_buy_rate,
            OrderSide::Sell => self.costs.commission_sell_rate,
        };
        (notional * rate).max(self.costs.commission_min)
    }

    // ── Mark-to-market and queries ─────────────────────────────────────

    /// Update per-symbol peak prices with the bar closes. Called once per
    /// bar before stop evaluation so trailing stops see today's high-water
    /// mark.
    pub fn update_peaks(&mut self, closes: &HashMap<String, f64>) {
        for (symbol, peak) in self.peaks.iter_mut() {
            if let Some(&close) = closes.get(symbol) {
                *peak = peak.max(close);
            }
        }
    }

    /// Mark-to-market equity: cash + Σ position quantity × mark price.
    /// Symbols without a mark fall back to their average cost.
    pub fn equity(&self, marks: &HashMap<String, f64>) -> f64 {
        let position_value: f64 = self
            .ledger
            .open_symbols()
            .iter()
            .map(|symbol| {
                let qty = self.ledger.total_quantity(symbol) as f64;
                let mark = marks
                    .get(symbol)
                    .copied()
                    .unwrap_or_else(|| self.ledger.avg_cost(symbol));
                qty * mark
            })
            .sum();
        self.cash + position_value
    }

    /// Position view for one symbol on `date`; None when flat.
    pub fn position(&self, symbol: &str, date: NaiveDate) -> Option<PositionView> {
        let quantity = self.ledger.total_quantity(symbol);
        if quantity == 0 {
            return None;
        }
        let avg_cost = self.ledger.avg_cost(symbol);
        Some(PositionView {
            symbol: symbol.to_string(),
            quantity,
            sellable: self.ledger.sellable_quantity(symbol, date),
            avg_cost,
            entry_date: self
                .ledger
                .earliest_entry(symbol)
                .expect("open position has lots"),
            peak_price: self.peaks.get(symbol).copied().unwrap_or(avg_cost),
        })
    }

    /// All open positions on `date`, in symbol order (deterministic).
    pub fn positions(&self, date: NaiveDate) -> Vec<PositionView> {
        self.ledger
            .open_symbols()
            .iter()
            .filter_map(|s| self.position(s, date))
            .collect()
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn fill_count(&self) -> usize {
        self.fill_count
    }

    pub fn into_trades(self) -> Vec<TradeRecord> {
        self.trades
    }
}
