//! Backtest engine: market data container, bar loop, run results.

pub mod data;
pub mod loop_runner;
pub mod result;

pub use data::{DataError, MarketData};
pub use loop_runner::{run_backtest, EngineError};
pub use result::{EquityPoint, RunResult};
