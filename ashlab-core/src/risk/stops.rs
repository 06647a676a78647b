//! Stop-loss rules — an ordered chain of pure predicates over a position
//! snapshot, evaluated in fixed priority order with first match winning.
//!
//! Priority: hard → trailing → time → volatility. At most one forced exit
//! per position per bar.

use crate::config::ConfigError;
use crate::domain::{PositionView, StopKind};
use serde::{Deserialize, Serialize};

/// Stop-loss thresholds. Defaults: 8% hard stop, 10% trailing drawdown,
/// 20-bar time stop, 2× volatility-baseline multiple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopConfig {
    pub hard_stop_pct: f64,
    pub trailing_pct: f64,
    pub max_holding_bars: usize,
    /// Time stop fires only while unrealized return is at or below this.
    pub time_stop_min_gain: f64,
    pub volatility_multiplier: f64,
}

impl Default for StopConfig {
    fn default() -> Self {
        Self {
            hard_stop_pct: 0.08,
            trailing_pct: 0.10,
            max_holding_bars: 20,
            time_stop_min_gain: 0.0,
            volatility_multiplier: 2.0,
        }
    }
}

impl StopConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("hard_stop_pct", self.hard_stop_pct),
            ("trailing_pct", self.trailing_pct),
        ] {
            if !(0.0..1.0).contains(&value) || value == 0.0 {
                return Err(ConfigError::RateOutOfRange {
                    name: name.to_string(),
                    value,
                });
            }
        }
        if self.volatility_multiplier <= 0.0 {
            return Err(ConfigError::RateOutOfRange {
                name: "volatility_multiplier".to_string(),
                value: self.volatility_multiplier,
            });
        }
        Ok(())
    }
}

/// Externally computed volatility inputs for the volatility stop; the
/// engine itself never computes indicators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskInputs {
    /// Recent realized volatility of the symbol (annualized).
    pub realized_vol: f64,
    /// Rolling baseline of the same measure.
    pub baseline_vol: f64,
}

/// Everything a stop rule may look at for one position on one bar.
#[derive(Debug, Clone)]
pub struct StopContext<'a> {
    pub position: &'a PositionView,
    /// Current bar close.
    pub close: f64,
    /// Bars elapsed since the earliest open lot's acquisition.
    pub bars_held: usize,
    pub risk_inputs: Option<RiskInputs>,
}

/// One rule in the chain: a pure predicate plus the stop kind it emits.
pub trait StopRule: Send + Sync {
    fn kind(&self) -> StopKind;
    fn triggered(&self, ctx: &StopContext<'_>) -> bool;
}

/// Hard stop: close at or below entry × (1 − pct).
pub struct HardStop {
    pub pct: f64,
}

impl StopRule for HardStop {
    fn kind(&self) -> StopKind {
        StopKind::Hard
    }

    fn triggered(&self, ctx: &StopContext<'_>) -> bool {
        ctx.close <= ctx.position.avg_cost * (1.0 - self.pct)
    }
}

/// Trailing stop: close at or below peak × (1 − pct), only while the
/// position is in profit (a losing position is the hard stop's job).
pub struct TrailingStop {
    pub pct: f64,
}

impl StopRule for TrailingStop {
    fn kind(&self) -> StopKind {
        StopKind::Trailing
    }

    fn triggered(&self, ctx: &StopContext<'_>) -> bool {
        let peak = ctx.position.peak_price;
        peak > 0.0
            && ctx.close <= peak * (1.0 - self.pct)
            && ctx.position.unrealized_pct(ctx.close) > 0.0
    }
}

/// Time stop: held too long without reaching the minimal gain.
pub struct TimeStop {
    pub max_holding_bars: usize,
    pub min_gain: f64,
}

impl StopRule for TimeStop {
    fn kind(&self) -> StopKind {
        StopKind::Time
    }

    fn triggered(&self, ctx: &StopContext<'_>) -> bool {
        ctx.bars_held >= self.max_holding_bars
            && ctx.position.unrealized_pct(ctx.close) <= self.min_gain
    }
}

/// Volatility stop: realized volatility exceeds a multiple of its baseline.
pub struct VolatilityStop {
    pub multiplier: f64,
}

impl StopRule for VolatilityStop {
    fn kind(&self) -> StopKind {
        StopKind::Volatility
    }

    fn triggered(&self, ctx: &StopContext<'_>) -> bool {
        match ctx.risk_inputs {
            Some(inputs) => {
                inputs.baseline_vol > 0.0
                    && inputs.realized_vol.is_finite()
                    && inputs.realized_vol >= self.multiplier * inputs.baseline_vol
            }
            None => false,
        }
    }
}

/// The default chain in priority order.
pub fn default_chain(config: &StopConfig) -> Vec<Box<dyn StopRule>> {
    vec![
        Box::new(HardStop {
            pct: config.hard_stop_pct,
        }),
        Box::new(TrailingStop {
            pct: config.trailing_pct,
        }),
        Box::new(TimeStop {
            max_holding_bars: config.max_holding_bars,
            min_gain: config.time_stop_min_gain,
        }),
        Box::new(VolatilityStop {
            multiplier: config.volatility_multiplier,
        }),
    ]
}

/// Walk the chain in order; first triggered rule wins.
pub fn evaluate_chain(chain: &[Box<dyn StopRule>], ctx: &StopContext<'_>) -> Option<StopKind> {
    chain
        .iter()
        .find(|rule| rule.triggered(ctx))
        .map(|rule| rule.kind())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn position(avg_cost: f64, peak: f64) -> PositionView {
        PositionView {
            symbol: "600519".into(),
            quantity: 1_000,
            sellable: 1_000,
            avg_cost,
            entry_date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            peak_price: peak,
        }
    }

    fn ctx<'a>(pos: &'a PositionView, close: f64, bars_held: usize) -> StopContext<'a> {
        StopContext {
            position: pos,
            close,
            bars_held,
            risk_inputs: None,
        }
    }

    #[test]
    fn hard_stop_at_threshold() {
        let pos = position(100.0, 100.0);
        let chain = default_chain(&StopConfig::default());
        // 8% hard stop: 92.0 triggers, 92.01 does not
        assert_eq!(evaluate_chain(&chain, &ctx(&pos, 92.0, 1)), Some(StopKind::Hard));
        assert_eq!(evaluate_chain(&chain, &ctx(&pos, 92.01, 1)), None);
    }

    #[test]
    fn trailing_stop_needs_profit() {
        let config = StopConfig::default();
        let chain = default_chain(&config);

        // Peak 130, close 117 = 10% off peak, still +17% vs cost → trailing
        let pos = position(100.0, 130.0);
        assert_eq!(
            evaluate_chain(&chain, &ctx(&pos, 117.0, 3)),
            Some(StopKind::Trailing)
        );

        // Same drawdown from peak but underwater → not a trailing stop
        // (close 99 vs cost 100; peak 110, 10% off peak)
        let pos = position(100.0, 110.0);
        assert_eq!(evaluate_chain(&chain, &ctx(&pos, 99.0, 3)), None);
    }

    #[test]
    fn hard_stop_wins_over_trailing() {
        // Close breaches both the hard stop and the trailing threshold;
        // priority order reports hard.
        let pos = position(100.0, 120.0);
        let chain = default_chain(&StopConfig::default());
        assert_eq!(evaluate_chain(&chain, &ctx(&pos, 90.0, 5)), Some(StopKind::Hard));
    }

    #[test]
    fn time_stop_requires_stagnation() {
        let config = StopConfig::default();
        let chain = default_chain(&config);
        let pos = position(100.0, 101.0);

        // 20 bars held, flat → time stop
        assert_eq!(
            evaluate_chain(&chain, &ctx(&pos, 100.0, 20)),
            Some(StopKind::Time)
        );
        // 20 bars held but profitable → hold
        assert_eq!(evaluate_chain(&chain, &ctx(&pos, 101.0, 20)), None);
        // 19 bars held → hold
        assert_eq!(evaluate_chain(&chain, &ctx(&pos, 100.0, 19)), None);
    }

    #[test]
    fn volatility_stop_uses_external_inputs() {
        let chain = default_chain(&StopConfig::default());
        let pos = position(100.0, 101.0);
        let mut context = ctx(&pos, 100.5, 2);

        context.risk_inputs = Some(RiskInputs {
            realized_vol: 0.60,
            baseline_vol: 0.20,
        });
        assert_eq!(
            evaluate_chain(&chain, &context),
            Some(StopKind::Volatility)
        );

        context.risk_inputs = Some(RiskInputs {
            realized_vol: 0.30,
            baseline_vol: 0.20,
        });
        assert_eq!(evaluate_chain(&chain, &context), None);

        // No inputs → rule stays silent.
        context.risk_inputs = None;
        assert_eq!(evaluate_chain(&chain, &context), None);
    }
}
