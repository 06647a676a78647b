//! Walk-forward validation — rolling train/test windows through time.
//!
//! Each window trains (via `Strategy::optimize`) on `train_bars` of data,
//! then re-runs the engine on the following `test_bars`, stepping forward
//! by `step_bars`. Windows own independent account state, so they run in
//! parallel; the strategy factory builds a fresh instance per window.

use ashlab_core::config::RunConfig;
use ashlab_core::engine::{run_backtest, EngineError, MarketData};
use ashlab_core::signals::Strategy;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metrics::{max_drawdown, sharpe_ratio, total_return};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkForwardConfig {
    /// Training window length in bars (default 252 = one year).
    pub train_bars: usize,
    /// Test window length in bars (default 63 = one quarter).
    pub test_bars: usize,
    /// Step between window starts (default 63).
    pub step_bars: usize,
}

impl Default for WalkForwardConfig {
    fn default() -> Self {
        Self {
            train_bars: 252,
            test_bars: 63,
            step_bars: 63,
        }
    }
}

#[derive(Debug, Error)]
pub enum WalkForwardError {
    #[error("insufficient data: {total_bars} bars < train {train_bars} + test {test_bars}")]
    InsufficientData {
        total_bars: usize,
        train_bars: usize,
        test_bars: usize,
    },

    #[error("window {window} failed: {source}")]
    WindowFailed {
        window: usize,
        #[source]
        source: EngineError,
    },
}

/// Out-of-sample result for one window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowResult {
    pub window_index: usize,
    pub train_start: NaiveDate,
    pub train_end: NaiveDate,
    pub test_start: NaiveDate,
    pub test_end: NaiveDate,
    pub total_return: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub trade_count: usize,
    pub halted: bool,
}

/// Aggregate over all windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkForwardSummary {
    pub windows: Vec<WindowResult>,
    pub mean_return: f64,
    pub std_return: f64,
    pub positive_windows: usize,
    pub mean_sharpe: f64,
}

/// Run walk-forward validation. `make_strategy` builds a fresh strategy
/// per window (windows must not share mutable state).
pub fn run_walk_forward<F>(
    data: &MarketData,
    run_config: &RunConfig,
    wf_config: &WalkForwardConfig,
    make_strategy: F,
) -> Result<WalkForwardSummary, WalkForwardError>
where
    F: Fn() -> Box<dyn Strategy> + Sync,
{
    let total = data.num_bars();
    let needed = wf_config.train_bars + wf_config.test_bars;
    if total < needed || wf_config.step_bars == 0 {
        return Err(WalkForwardError::InsufficientData {
            total_bars: total,
            train_bars: wf_config.train_bars,
            test_bars: wf_config.test_bars,
        });
    }

    // Window start offsets, fixed up front so the parallel map is stable.
    let mut starts = Vec::new();
    let mut start = 0usize;
    while start + needed <= total {
        starts.push(start);
        start += wf_config.step_bars;
    }

    let windows: Result<Vec<WindowResult>, WalkForwardError> = starts
        .par_iter()
        .enumerate()
        .map(|(window_index, &start)| {
            let train = data.slice(start, start + wf_config.train_bars);
            let test = data.slice(
                start + wf_config.train_bars,
                start + wf_config.train_bars + wf_config.test_bars,
            );

            let mut strategy = make_strategy();
            strategy.optimize(&train);

            let result = run_backtest(&test, strategy.as_mut(), run_config).map_err(|source| {
                WalkForwardError::WindowFailed {
                    window: window_index,
                    source,
                }
            })?;

            let equity = result.equity_values();
            Ok(WindowResult {
                window_index,
                train_start: train.dates()[0],
                train_end: *train.dates().last().unwrap(),
                test_start: test.dates()[0],
                test_end: *test.dates().last().unwrap(),
                total_return: total_return(&equity),
                sharpe: sharpe_ratio(&equity),
                max_drawdown: max_drawdown(&equity).0,
                trade_count: result.fill_count,
                halted: result.account.trading_halted,
            })
        })
        .collect();
    let windows = windows?;

    let returns: Vec<f64> = windows.iter().map(|w| w.total_return).collect();
    let sharpes: Vec<f64> = windows.iter().map(|w| w.sharpe).collect();
    Ok(WalkForwardSummary {
        mean_return: crate::metrics::mean(&returns),
        std_return: crate::metrics::std_dev(&returns),
        positive_windows: returns.iter().filter(|&&r| r > 0.0).count(),
        mean_sharpe: crate::metrics::mean(&sharpes),
        windows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ashlab_core::domain::Bar;
    use ashlab_core::signals::Scripted;
    use std::collections::BTreeMap;

    fn make_data(n: usize) -> MarketData {
        let base = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
        let bars: Vec<Bar> = (0..n)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.05).sin() * 5.0;
                Bar {
                    symbol: "600519".into(),
                    date: base + chrono::Duration::days(i as i64),
                    open: close - 0.2,
                    high: close + 1.0,
                    low: close - 1.2,
                    close,
                    volume: 1_000,
                    prev_close: close,
                    is_st: false,
                }
            })
            .collect();
        let mut series = BTreeMap::new();
        series.insert("600519".to_string(), bars.clone());
        MarketData::new(series, bars).unwrap()
    }

    #[test]
    fn rejects_short_history() {
        let data = make_data(100);
        let err = run_walk_forward(
            &data,
            &RunConfig::default(),
            &WalkForwardConfig::default(),
            || Box::new(Scripted::empty()),
        )
        .unwrap_err();
        assert!(matches!(err, WalkForwardError::InsufficientData { .. }));
    }

    #[test]
    fn window_arithmetic() {
        let data = make_data(500);
        let wf = WalkForwardConfig {
            train_bars: 252,
            test_bars: 63,
            step_bars: 63,
        };
        let summary = run_walk_forward(&data, &RunConfig::default(), &wf, || {
            Box::new(Scripted::empty())
        })
        .unwrap();
        // Starts at 0, 63, 126: 126 + 315 <= 500, 189 + 315 > 500.
        assert_eq!(summary.windows.len(), 3);
        for (i, w) in summary.windows.iter().enumerate() {
            assert_eq!(w.window_index, i);
            assert_eq!(w.trade_count, 0);
            assert_eq!(w.total_return, 0.0);
        }
        assert_eq!(summary.positive_windows, 0);
    }

    #[test]
    fn windows_are_chronological() {
        let data = make_data(450);
        let wf = WalkForwardConfig {
            train_bars: 200,
            test_bars: 50,
            step_bars: 100,
        };
        let summary = run_walk_forward(&data, &RunConfig::default(), &wf, || {
            Box::new(Scripted::empty())
        })
        .unwrap();
        for w in &summary.windows {
            assert!(w.train_end < w.test_start);
            assert!(w.test_start <= w.test_end);
        }
    }
}
