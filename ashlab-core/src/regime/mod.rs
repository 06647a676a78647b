//! Market regime filter — classifies the benchmark's trend/volatility state
//! and maps it to an exposure multiplier for new buys.
//!
//! Classification per bar, a pure function of benchmark history up to and
//! including that bar:
//! - bull:  close > slow MA and fast MA > slow MA
//! - bear:  close < slow MA and fast MA < slow MA
//! - choppy: everything else, including the MA warmup prefix
//!
//! High benchmark volatility downgrades bull to choppy. The multiplier
//! scales new buy notional only; forced exits are never scaled.

use crate::config::ConfigError;
use crate::indicators::{rolling_volatility, sma};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    Bull,
    Bear,
    Choppy,
}

impl Regime {
    pub fn as_str(self) -> &'static str {
        match self {
            Regime::Bull => "bull",
            Regime::Bear => "bear",
            Regime::Choppy => "choppy",
        }
    }
}

/// Regime filter parameters. Defaults: MA20/MA60 trend, 20-bar annualized
/// volatility with a 0.35 ceiling, exposure 1.0 / 0.5 / 0.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeConfig {
    pub fast_period: usize,
    pub slow_period: usize,
    pub vol_period: usize,
    /// Annualized benchmark volatility above this downgrades bull → choppy.
    pub vol_threshold: f64,
    pub bull_exposure: f64,
    pub choppy_exposure: f64,
    pub bear_exposure: f64,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            fast_period: 20,
            slow_period: 60,
            vol_period: 20,
            vol_threshold: 0.35,
            bull_exposure: 1.0,
            choppy_exposure: 0.5,
            bear_exposure: 0.0,
        }
    }
}

impl RegimeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fast_period >= self.slow_period {
            return Err(ConfigError::RateOutOfRange {
                name: "regime fast_period must be < slow_period".to_string(),
                value: self.fast_period as f64,
            });
        }
        for (name, value) in [
            ("bull_exposure", self.bull_exposure),
            ("choppy_exposure", self.choppy_exposure),
            ("bear_exposure", self.bear_exposure),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RateOutOfRange {
                    name: name.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Precomputed regime series over the benchmark closes.
///
/// The moving averages and volatility at index `i` use only closes up to
/// `i`, so per-bar lookups never see the future.
pub struct RegimeFilter {
    config: RegimeConfig,
    fast_ma: Vec<f64>,
    slow_ma: Vec<f64>,
    volatility: Vec<f64>,
}

impl RegimeFilter {
    pub fn new(config: RegimeConfig, benchmark_closes: &[f64]) -> Self {
        Self {
            fast_ma: sma(benchmark_closes, config.fast_period),
            slow_ma: sma(benchmark_closes, config.slow_period),
            volatility: rolling_volatility(
                benchmark_closes,
                config.vol_period.max(2),
            ),
            config,
        }
    }

    /// Classify the benchmark state at bar `index`.
    pub fn classify(&self, index: usize, close: f64) -> Regime {
        let fast = self.fast_ma.get(index).copied().unwrap_or(f64::NAN);
        let slow = self.slow_ma.get(index).copied().unwrap_or(f64::NAN);
        if fast.is_nan() || slow.is_nan() {
            return Regime::Choppy;
        }

        let trend = if close > slow && fast > slow {
            Regime::Bull
        } else if close < slow && fast < slow {
            Regime::Bear
        } else {
            Regime::Choppy
        };

        if trend == Regime::Bull {
            let vol = self.volatility.get(index).copied().unwrap_or(f64::NAN);
            if vol.is_finite() && vol > self.config.vol_threshold {
                return Regime::Choppy;
            }
        }
        trend
    }

    /// Exposure multiplier applied to new buy notional at bar `index`.
    pub fn exposure(&self, index: usize, close: f64) -> f64 {
        match self.classify(index, close) {
            Regime::Bull => self.config.bull_exposure,
            Regime::Choppy => self.config.choppy_exposure,
            Regime::Bear => self.config.bear_exposure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter_over(closes: &[f64]) -> RegimeFilter {
        let config = RegimeConfig {
            fast_period: 3,
            slow_period: 5,
            vol_period: 5,
            vol_threshold: 10.0, // effectively off unless a test lowers it
            ..RegimeConfig::default()
        };
        RegimeFilter::new(config, closes)
    }

    #[test]
    fn warmup_is_choppy() {
        let closes = [100.0, 101.0, 102.0];
        let filter = filter_over(&closes);
        assert_eq!(filter.classify(0, closes[0]), Regime::Choppy);
        assert_eq!(filter.classify(2, closes[2]), Regime::Choppy);
    }

    #[test]
    fn uptrend_is_bull() {
        let closes: Vec<f64> = (0..12).map(|i| 100.0 + i as f64).collect();
        let filter = filter_over(&closes);
        let last = closes.len() - 1;
        assert_eq!(filter.classify(last, closes[last]), Regime::Bull);
        assert_eq!(filter.exposure(last, closes[last]), 1.0);
    }

    #[test]
    fn downtrend_is_bear() {
        let closes: Vec<f64> = (0..12).map(|i| 100.0 - i as f64).collect();
        let filter = filter_over(&closes);
        let last = closes.len() - 1;
        assert_eq!(filter.classify(last, closes[last]), Regime::Bear);
        assert_eq!(filter.exposure(last, closes[last]), 0.0);
    }

    #[test]
    fn mixed_trend_is_choppy() {
        // Close above the slow MA but fast MA below it: recent pullback in
        // a longer uptrend.
        let closes = [100.0, 104.0, 108.0, 103.0, 101.0, 102.0, 106.0];
        let filter = filter_over(&closes);
        let last = closes.len() - 1;
        let regime = filter.classify(last, closes[last]);
        assert_eq!(regime, Regime::Choppy);
        assert_eq!(filter.exposure(last, closes[last]), 0.5);
    }

    #[test]
    fn high_volatility_downgrades_bull() {
        // Strong uptrend with violent daily swings.
        let mut closes = Vec::new();
        let mut price = 100.0;
        for i in 0..15 {
            price *= if i % 2 == 0 { 1.08 } else { 0.98 };
            closes.push(price);
        }
        let config = RegimeConfig {
            fast_period: 3,
            slow_period: 5,
            vol_period: 5,
            vol_threshold: 0.30,
            ..RegimeConfig::default()
        };
        let filter = RegimeFilter::new(config, &closes);
        let last = closes.len() - 1;
        assert_eq!(filter.classify(last, closes[last]), Regime::Choppy);
    }

    #[test]
    fn config_rejects_inverted_periods() {
        let config = RegimeConfig {
            fast_period: 60,
            slow_period: 20,
            ..RegimeConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
