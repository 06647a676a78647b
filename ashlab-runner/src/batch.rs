//! Batch strategy comparison — independent runs in parallel.
//!
//! Runs own their account state and equity curve; the only shared resource
//! is the read-only `MarketData`, passed by reference to every worker.

use ashlab_core::config::RunConfig;
use ashlab_core::engine::{run_backtest, EngineError, MarketData};
use ashlab_core::signals::Strategy;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::metrics::PerformanceMetrics;

/// One strategy's outcome in a comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonEntry {
    pub name: String,
    pub metrics: PerformanceMetrics,
    pub final_equity: f64,
    pub fill_count: usize,
    pub halted: bool,
}

/// Run every named strategy over the same data and rank by final equity.
pub fn compare_strategies(
    data: &MarketData,
    config: &RunConfig,
    strategies: Vec<(String, Box<dyn Strategy>)>,
) -> Result<Vec<ComparisonEntry>, EngineError> {
    let mut entries: Vec<ComparisonEntry> = strategies
        .into_par_iter()
        .map(|(name, mut strategy)| {
            let result = run_backtest(data, strategy.as_mut(), config)?;
            log::info!(
                "compared {name}: final equity {:.2}, {} fills",
                result.final_equity,
                result.fill_count
            );
            Ok(ComparisonEntry {
                name,
                metrics: PerformanceMetrics::from_run(&result),
                final_equity: result.final_equity,
                fill_count: result.fill_count,
                halted: result.account.trading_halted,
            })
        })
        .collect::<Result<_, EngineError>>()?;

    entries.sort_by(|a, b| {
        b.final_equity
            .total_cmp(&a.final_equity)
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ashlab_core::domain::Bar;
    use ashlab_core::signals::{Momentum, Scripted};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn make_data(n: usize) -> MarketData {
        let base = NaiveDate::from_ymd_opt(2021, 1, 4).unwrap();
        let bars: Vec<Bar> = (0..n)
            .map(|i| {
                let close = 100.0 + i as f64 * 0.5;
                Bar {
                    symbol: "600519".into(),
                    date: base + chrono::Duration::days(i as i64),
                    open: close - 0.2,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1_000,
                    prev_close: close - 0.5,
                    is_st: false,
                }
            })
            .collect();
        let mut series = BTreeMap::new();
        series.insert("600519".to_string(), bars.clone());
        MarketData::new(series, bars).unwrap()
    }

    #[test]
    fn comparison_is_ranked_and_deterministic() {
        let data = make_data(120);
        let config = RunConfig {
            initial_capital: 100_000.0,
            ..RunConfig::default()
        };
        let build = || -> Vec<(String, Box<dyn Strategy>)> {
            vec![
                ("idle".to_string(), Box::new(Scripted::empty())),
                (
                    "momentum".to_string(),
                    Box::new(Momentum::default_params()),
                ),
            ]
        };

        let a = compare_strategies(&data, &config, build()).unwrap();
        let b = compare_strategies(&data, &config, build()).unwrap();

        assert_eq!(a.len(), 2);
        assert!(a[0].final_equity >= a[1].final_equity);
        // Parallel execution must not perturb the outcome.
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.name, y.name);
            assert_eq!(x.final_equity, y.final_equity);
        }
    }
}
