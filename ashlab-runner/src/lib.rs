//! ashlab-runner — backtest orchestration on top of `ashlab-core`.
//!
//! This crate provides:
//! - CSV data loading with derived prev-close and volatility inputs
//! - Single-backtest runner with metrics
//! - Benchmark-relative performance statistics
//! - Monte Carlo trade resampling and walk-forward validation
//! - Parallel batch strategy comparison
//! - Trade/equity/summary artifact export

pub mod batch;
pub mod config;
pub mod data_loader;
pub mod metrics;
pub mod monte_carlo;
pub mod report;
pub mod runner;
pub mod walk_forward;

pub use batch::{compare_strategies, ComparisonEntry};
pub use config::{load_backtest_file, BacktestFile, ConfigFileError, DataSection, StrategySpec};
pub use data_loader::{load_market_data, load_symbol_csv, LoadError, LoadOptions};
pub use metrics::{BenchmarkComparison, PerformanceMetrics};
pub use monte_carlo::{
    resample_returns, resample_run, MonteCarloConfig, MonteCarloError, MonteCarloSummary,
};
pub use report::{save_artifacts, write_equity_csv, write_summary_json, write_trades_csv};
pub use runner::{load_inputs, run_from_file, run_single_backtest, BacktestReport, RunnerError};
pub use walk_forward::{
    run_walk_forward, WalkForwardConfig, WalkForwardError, WalkForwardSummary, WindowResult,
};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn result_types_are_send_sync() {
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
        assert_send::<MonteCarloSummary>();
        assert_sync::<MonteCarloSummary>();
        assert_send::<WalkForwardSummary>();
        assert_sync::<WalkForwardSummary>();
        assert_send::<ComparisonEntry>();
        assert_sync::<ComparisonEntry>();
    }
}
