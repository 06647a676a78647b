//! Serializable backtest configuration files (TOML).
//!
//! One file describes a complete run: engine parameters, data location,
//! strategy choice, and validation settings. The engine's `RunConfig`
//! nests under `[run]` so defaults apply field-by-field.

use ashlab_core::config::RunConfig;
use ashlab_core::signals::{Momentum, Strategy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::monte_carlo::MonteCarloConfig;
use crate::walk_forward::WalkForwardConfig;

#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Complete description of a backtest: engine config + data + strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestFile {
    #[serde(default)]
    pub run: RunConfig,
    pub data: DataSection,
    pub strategy: StrategySpec,
    #[serde(default)]
    pub walk_forward: WalkForwardConfig,
    #[serde(default)]
    pub monte_carlo: MonteCarloConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSection {
    /// Directory holding `<symbol>.csv` files.
    pub dir: PathBuf,
    pub symbols: Vec<String>,
    /// Benchmark symbol; `<benchmark>.csv` must exist in `dir`.
    pub benchmark: String,
}

/// Strategy selection (serializable tagged enum).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategySpec {
    Momentum {
        #[serde(default = "default_momentum_period")]
        momentum_period: usize,
        #[serde(default = "default_top_n")]
        top_n: usize,
        #[serde(default = "default_position_pct")]
        position_pct: f64,
        #[serde(default = "default_rebalance_period")]
        rebalance_period: usize,
    },
}

fn default_momentum_period() -> usize {
    20
}
fn default_top_n() -> usize {
    3
}
fn default_position_pct() -> f64 {
    0.25
}
fn default_rebalance_period() -> usize {
    5
}

impl StrategySpec {
    pub fn name(&self) -> &'static str {
        match self {
            StrategySpec::Momentum { .. } => "momentum",
        }
    }

    /// Build a fresh strategy instance (one per run or window).
    pub fn build(&self) -> Box<dyn Strategy> {
        match *self {
            StrategySpec::Momentum {
                momentum_period,
                top_n,
                position_pct,
                rebalance_period,
            } => {
                let mut strategy = Momentum::new(momentum_period, top_n, position_pct);
                strategy.rebalance_period = rebalance_period;
                Box::new(strategy)
            }
        }
    }
}

pub fn load_backtest_file(path: &Path) -> Result<BacktestFile, ConfigFileError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigFileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [data]
        dir = "data"
        symbols = ["600519", "300750"]
        benchmark = "000300"

        [strategy]
        type = "momentum"
    "#;

    #[test]
    fn minimal_file_uses_defaults() {
        let file: BacktestFile = toml::from_str(MINIMAL).unwrap();
        assert_eq!(file.run, RunConfig::default());
        assert_eq!(file.data.symbols.len(), 2);
        assert_eq!(file.strategy.name(), "momentum");
        assert_eq!(file.walk_forward.train_bars, 252);
        assert_eq!(file.monte_carlo.n_paths, 1_000);
    }

    #[test]
    fn overrides_apply() {
        let text = r#"
            [run]
            initial_capital = 500000.0
            max_drawdown_pct = 0.2

            [run.stops]
            hard_stop_pct = 0.05

            [data]
            dir = "bars"
            symbols = ["600519"]
            benchmark = "000300"

            [strategy]
            type = "momentum"
            momentum_period = 40
            top_n = 1
        "#;
        let file: BacktestFile = toml::from_str(text).unwrap();
        assert_eq!(file.run.initial_capital, 500_000.0);
        assert_eq!(file.run.max_drawdown_pct, 0.2);
        assert_eq!(file.run.stops.hard_stop_pct, 0.05);
        // Unspecified stop fields keep their defaults.
        assert_eq!(file.run.stops.trailing_pct, 0.10);
        match file.strategy {
            StrategySpec::Momentum {
                momentum_period,
                top_n,
                position_pct,
                ..
            } => {
                assert_eq!(momentum_period, 40);
                assert_eq!(top_n, 1);
                assert_eq!(position_pct, 0.25);
            }
        }
    }

    #[test]
    fn built_strategy_carries_params() {
        let spec = StrategySpec::Momentum {
            momentum_period: 10,
            top_n: 2,
            position_pct: 0.5,
            rebalance_period: 3,
        };
        let strategy = spec.build();
        assert_eq!(strategy.name(), "momentum");
    }
}
