//! Backtest runner — wires together data loading, the engine, and metrics.
//!
//! Two entry points:
//! - `run_single_backtest()`: pre-loaded data + strategy, no I/O.
//! - `run_from_file()`: TOML config → data loading → run. Used by the CLI.

use ashlab_core::config::RunConfig;
use ashlab_core::engine::{run_backtest, EngineError, MarketData, RunResult};
use ashlab_core::signals::Strategy;
use thiserror::Error;

use crate::config::{load_backtest_file, BacktestFile, ConfigFileError};
use crate::data_loader::{load_market_data, LoadError, LoadOptions};
use crate::metrics::PerformanceMetrics;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("config error: {0}")]
    ConfigFile(#[from] ConfigFileError),

    #[error("data error: {0}")]
    Load(#[from] LoadError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// A run result paired with its computed metrics.
#[derive(Debug, Clone)]
pub struct BacktestReport {
    pub result: RunResult,
    pub metrics: PerformanceMetrics,
}

/// Run one backtest over pre-loaded data — no I/O.
pub fn run_single_backtest(
    data: &MarketData,
    strategy: &mut dyn Strategy,
    config: &RunConfig,
) -> Result<BacktestReport, RunnerError> {
    let result = run_backtest(data, strategy, config)?;
    let metrics = PerformanceMetrics::from_run(&result);
    Ok(BacktestReport { result, metrics })
}

/// Load everything a TOML config names and run it.
pub fn run_from_file(path: &std::path::Path) -> Result<BacktestReport, RunnerError> {
    let file = load_backtest_file(path)?;
    let (data, mut strategy) = load_inputs(&file)?;
    run_single_backtest(&data, strategy.as_mut(), &file.run)
}

/// Shared loading step for the CLI subcommands: market data + strategy.
pub fn load_inputs(file: &BacktestFile) -> Result<(MarketData, Box<dyn Strategy>), RunnerError> {
    let data = load_market_data(
        &file.data.dir,
        &file.data.symbols,
        &file.data.benchmark,
        &LoadOptions::default(),
    )?;
    Ok((data, file.strategy.build()))
}
