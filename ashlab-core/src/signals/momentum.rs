//! Momentum strategy — rate-of-change ranked entries, trend-loss exits.
//!
//! Buys the top-ranked symbols by trailing return on a rebalance cadence;
//! exits a holding when its momentum turns negative. Confidence is the
//! clamped momentum score.

use super::{BarContext, SignalEvent, SignalKind, Strategy};
use crate::engine::data::MarketData;
use crate::indicators::roc;

pub struct Momentum {
    /// Trailing-return lookback in bars.
    pub momentum_period: usize,
    /// Number of top-ranked symbols to hold.
    pub top_n: usize,
    /// Fraction of equity per new position.
    pub position_pct: f64,
    /// Bars between entry rebalances; exits are checked every bar.
    pub rebalance_period: usize,
    /// Minimum trailing return to qualify for entry.
    pub entry_threshold: f64,
    last_rebalance: Option<usize>,
}

impl Momentum {
    pub fn new(momentum_period: usize, top_n: usize, position_pct: f64) -> Self {
        assert!(momentum_period >= 1, "momentum_period must be >= 1");
        assert!(top_n >= 1, "top_n must be >= 1");
        assert!(
            position_pct > 0.0 && position_pct <= 1.0,
            "position_pct must be in (0, 1]"
        );
        Self {
            momentum_period,
            top_n,
            position_pct,
            rebalance_period: 5,
            entry_threshold: 0.02,
            last_rebalance: None,
        }
    }

    pub fn default_params() -> Self {
        Self::new(20, 3, 0.25)
    }

    fn momentum_at(&self, data: &MarketData, symbol: &str, t: usize) -> Option<f64> {
        let closes = data.closes(symbol)?;
        let score = *roc(&closes[..=t.min(closes.len() - 1)], self.momentum_period).last()?;
        score.is_finite().then_some(score)
    }
}

impl Strategy for Momentum {
    fn name(&self) -> &str {
        "momentum"
    }

    fn on_bar(&mut self, ctx: &BarContext<'_>) -> Vec<SignalEvent> {
        let mut events = Vec::new();
        let t = ctx.bar_index;

        // Exits first: momentum gone, position out.
        for pos in ctx.positions {
            let Some(score) = self.momentum_at(ctx.data, &pos.symbol, t) else {
                continue;
            };
            if score < 0.0 && pos.sellable > 0 {
                events.push(SignalEvent {
                    symbol: pos.symbol.clone(),
                    kind: SignalKind::Sell {
                        quantity: pos.sellable,
                    },
                    confidence: (-score).clamp(0.0, 1.0),
                });
            }
        }

        // Entries only on the rebalance cadence.
        let due = match self.last_rebalance {
            None => true,
            Some(last) => t.saturating_sub(last) >= self.rebalance_period,
        };
        if !due {
            return events;
        }
        self.last_rebalance = Some(t);

        let mut ranked: Vec<(String, f64)> = ctx
            .data
            .symbols()
            .iter()
            .filter(|s| !ctx.has_position(s))
            .filter_map(|s| {
                self.momentum_at(ctx.data, s, t)
                    .filter(|score| *score >= self.entry_threshold)
                    .map(|score| (s.clone(), score))
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let open_slots = self.top_n.saturating_sub(ctx.positions.len());
        for (symbol, score) in ranked.into_iter().take(open_slots) {
            events.push(SignalEvent {
                symbol,
                kind: SignalKind::Buy {
                    notional: ctx.equity * self.position_pct,
                },
                confidence: score.clamp(0.0, 1.0),
            });
        }
        events
    }

    /// Walk-forward retune: pick the lookback whose sign-following return
    /// over the training slice is best.
    fn optimize(&mut self, train: &MarketData) {
        const CANDIDATES: [usize; 3] = [10, 20, 40];

        let mut best = (self.momentum_period, f64::NEG_INFINITY);
        for period in CANDIDATES {
            let mut total = 0.0;
            let mut samples = 0usize;
            for symbol in train.symbols() {
                let Some(closes) = train.closes(symbol) else {
                    continue;
                };
                let scores = roc(&closes, period);
                for i in period..closes.len().saturating_sub(1) {
                    let score = scores[i];
                    let next = closes[i + 1] / closes[i] - 1.0;
                    if score.is_finite() && next.is_finite() {
                        total += score.signum() * next;
                        samples += 1;
                    }
                }
            }
            if samples > 0 {
                let mean = total / samples as f64;
                if mean > best.1 {
                    best = (period, mean);
                }
            }
        }
        self.momentum_period = best.0;
        self.last_rebalance = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn trending_data(up: &str, down: &str, n: usize) -> MarketData {
        let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let mut series = BTreeMap::new();
        for (symbol, slope) in [(up, 1.0), (down, -0.8)] {
            let bars: Vec<Bar> = (0..n)
                .map(|i| {
                    let close = 100.0 + slope * i as f64;
                    Bar {
                        symbol: symbol.into(),
                        date: base + chrono::Duration::days(i as i64),
                        open: close - 0.2,
                        high: close + 0.5,
                        low: close - 0.5,
                        close,
                        volume: 1_000,
                        prev_close: close - slope,
                        is_st: false,
                    }
                })
                .collect();
            series.insert(symbol.to_string(), bars);
        }
        let benchmark = series.get(up).unwrap().clone();
        MarketData::new(series, benchmark).unwrap()
    }

    #[test]
    fn ranks_uptrending_symbol_first() {
        let data = trending_data("600519", "000001", 30);
        let mut strategy = Momentum::new(10, 1, 0.5);
        let ctx = BarContext {
            bar_index: 29,
            date: data.dates()[29],
            data: &data,
            equity: 100_000.0,
            cash: 100_000.0,
            positions: &[],
            drawdown: 0.0,
        };
        let events = strategy.on_bar(&ctx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].symbol, "600519");
        assert!(matches!(events[0].kind, SignalKind::Buy { notional } if notional == 50_000.0));
    }

    #[test]
    fn no_entries_before_warmup() {
        let data = trending_data("600519", "000001", 30);
        let mut strategy = Momentum::new(10, 1, 0.5);
        let ctx = BarContext {
            bar_index: 3,
            date: data.dates()[3],
            data: &data,
            equity: 100_000.0,
            cash: 100_000.0,
            positions: &[],
            drawdown: 0.0,
        };
        assert!(strategy.on_bar(&ctx).is_empty());
    }

    #[test]
    fn optimize_settles_on_a_candidate() {
        let data = trending_data("600519", "000001", 120);
        let mut strategy = Momentum::default_params();
        strategy.optimize(&data);
        assert!([10, 20, 40].contains(&strategy.momentum_period));
    }
}
