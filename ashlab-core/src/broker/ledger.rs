//! Lot ledger — per-symbol open lots with T+1 settlement and FIFO consumption.

use crate::domain::{Lot, OrderReject};
use chrono::NaiveDate;
use std::collections::HashMap;

/// What a sale consumed: cost basis for PnL attribution and the consumed
/// acquisition dates for time-stop bookkeeping on the remaining position.
#[derive(Debug, Clone, PartialEq)]
pub struct Consumed {
    /// Total cost basis of the consumed shares.
    pub cost_basis: f64,
    /// Earliest acquisition date among consumed lots.
    pub earliest_acquired: NaiveDate,
    /// (acquisition date, quantity) per consumed lot slice, oldest first.
    pub lots: Vec<(NaiveDate, u64)>,
}

/// Per-symbol collection of open purchase lots.
#[derive(Debug, Clone, Default)]
pub struct LotLedger {
    lots: HashMap<String, Vec<Lot>>,
}

impl LotLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new lot. Lots stay in acquisition order: `acquire` is only
    /// called with the current bar date, which never decreases.
    pub fn acquire(&mut self, symbol: &str, date: NaiveDate, quantity: u64, price: f64) {
        self.lots
            .entry(symbol.to_string())
            .or_default()
            .push(Lot::new(quantity, price, date));
    }

    /// Shares of `symbol` sellable on `date` under T+1.
    pub fn sellable_quantity(&self, symbol: &str, date: NaiveDate) -> u64 {
        self.lots
            .get(symbol)
            .map(|lots| lots.iter().map(|l| l.sellable_on(date)).sum())
            .unwrap_or(0)
    }

    /// Total open shares of `symbol`, sellable or not.
    pub fn total_quantity(&self, symbol: &str) -> u64 {
        self.lots
            .get(symbol)
            .map(|lots| lots.iter().map(|l| l.quantity).sum())
            .unwrap_or(0)
    }

    /// Remove `quantity` shares from sellable lots, oldest first.
    ///
    /// Fails without mutating when `quantity` exceeds the sellable total.
    /// Fully consumed lots are removed; a partially consumed lot keeps its
    /// original acquisition date with reduced quantity. Non-sellable lots
    /// are never touched.
    pub fn consume(
        &mut self,
        symbol: &str,
        quantity: u64,
        date: NaiveDate,
    ) -> Result<Consumed, OrderReject> {
        let sellable = self.sellable_quantity(symbol, date);
        if quantity == 0 || quantity > sellable {
            return Err(OrderReject::InsufficientSellableShares {
                requested: quantity,
                sellable,
            });
        }

        let lots = self.lots.get_mut(symbol).expect("sellable > 0 implies lots");
        let mut remaining = quantity;
        let mut cost_basis = 0.0;
        let mut consumed_lots: Vec<(NaiveDate, u64)> = Vec::new();

        for lot in lots.iter_mut() {
            if remaining == 0 {
                break;
            }
            let take = lot.sellable_on(date).min(remaining);
            if take == 0 {
                continue;
            }
            cost_basis += take as f64 * lot.cost_basis;
            consumed_lots.push((lot.acquired, take));
            lot.quantity -= take;
            remaining -= take;
        }
        debug_assert_eq!(remaining, 0, "sellable check must cover the request");

        lots.retain(|l| l.quantity > 0);
        if lots.is_empty() {
            self.lots.remove(symbol);
        }

        let earliest_acquired = consumed_lots
            .iter()
            .map(|(d, _)| *d)
            .min()
            .expect("at least one lot consumed");

        Ok(Consumed {
            cost_basis,
            earliest_acquired,
            lots: consumed_lots,
        })
    }

    /// Open lots for a symbol, oldest first. Empty when flat.
    pub fn lots(&self, symbol: &str) -> &[Lot] {
        self.lots.get(symbol).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Symbols with at least one open lot, sorted for deterministic iteration.
    pub fn open_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.lots.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Quantity-weighted average cost per share; zero when flat.
    pub fn avg_cost(&self, symbol: &str) -> f64 {
        let lots = self.lots(symbol);
        let total: u64 = lots.iter().map(|l| l.quantity).sum();
        if total == 0 {
            return 0.0;
        }
        lots.iter()
            .map(|l| l.quantity as f64 * l.cost_basis)
            .sum::<f64>()
            / total as f64
    }

    /// Acquisition date of the earliest open lot.
    pub fn earliest_entry(&self, symbol: &str) -> Option<NaiveDate> {
        self.lots(symbol).iter().map(|l| l.acquired).min()
    }
}
