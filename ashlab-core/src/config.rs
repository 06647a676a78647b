//! Run configuration — one immutable object constructed per run and passed
//! to every component. No ambient global state.

use crate::regime::RegimeConfig;
use crate::risk::StopConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which bar price anchors order execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ExecTiming {
    /// Fill off the bar's open (orders decided on yesterday's close trade
    /// at today's open).
    #[default]
    Open,
    /// Fill off the bar's close.
    Close,
}

/// Transaction cost model: commission, stamp duty, slippage.
///
/// Defaults are realistic A-share retail costs: 0.025% commission with a
/// 5 CNY minimum, 0.1% stamp duty on sells only, 0.1% slippage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    pub commission_buy_rate: f64,
    pub commission_sell_rate: f64,
    pub commission_min: f64,
    pub stamp_tax_rate: f64,
    pub slippage_rate: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            commission_buy_rate: 0.000_25,
            commission_sell_rate: 0.000_25,
            commission_min: 5.0,
            stamp_tax_rate: 0.001,
            slippage_rate: 0.001,
        }
    }
}

/// Complete configuration for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub initial_capital: f64,
    pub costs: CostConfig,
    pub stops: StopConfig,
    /// Account-level drawdown ceiling; breach halts trading for the run.
    pub max_drawdown_pct: f64,
    pub regime: RegimeConfig,
    pub timing: ExecTiming,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            initial_capital: 1_000_000.0,
            costs: CostConfig::default(),
            stops: StopConfig::default(),
            max_drawdown_pct: 0.15,
            regime: RegimeConfig::default(),
            timing: ExecTiming::default(),
        }
    }
}

impl RunConfig {
    /// Validate once at run start; invalid configuration aborts the run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_capital <= 0.0 {
            return Err(ConfigError::NonPositiveCapital(self.initial_capital));
        }
        let rates = [
            ("commission_buy_rate", self.costs.commission_buy_rate),
            ("commission_sell_rate", self.costs.commission_sell_rate),
            ("stamp_tax_rate", self.costs.stamp_tax_rate),
            ("slippage_rate", self.costs.slippage_rate),
        ];
        for (name, rate) in rates {
            if !(0.0..1.0).contains(&rate) {
                return Err(ConfigError::RateOutOfRange {
                    name: name.to_string(),
                    value: rate,
                });
            }
        }
        if !(0.0..1.0).contains(&self.max_drawdown_pct) || self.max_drawdown_pct == 0.0 {
            return Err(ConfigError::RateOutOfRange {
                name: "max_drawdown_pct".to_string(),
                value: self.max_drawdown_pct,
            });
        }
        self.stops.validate()?;
        self.regime.validate()?;
        Ok(())
    }

    /// Deterministic hash of the full configuration, for run identity.
    pub fn config_hash(&self) -> String {
        let json = serde_json::to_string(self).expect("RunConfig must serialize");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

/// Configuration validation failures — irrecoverable, surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("initial capital must be positive, got {0}")]
    NonPositiveCapital(f64),

    #[error("{name} out of range: {value}")]
    RateOutOfRange { name: String, value: f64 },
}
