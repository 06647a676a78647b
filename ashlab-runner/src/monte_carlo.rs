//! Monte Carlo validation — resample closed-trade returns with replacement
//! and rebuild synthetic equity paths.
//!
//! Each path draws `n_trades` returns from the realized distribution and
//! compounds them. Paths share no state, so they are evaluated in
//! parallel; each path seeds its own RNG from the base seed and its
//! index, which keeps results independent of worker scheduling.

use ashlab_core::engine::RunResult;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    /// Number of resampled paths (default 1000).
    pub n_paths: usize,
    /// Base RNG seed for reproducibility.
    pub seed: u64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            n_paths: 1_000,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum MonteCarloError {
    #[error("no closed trades to resample")]
    NoClosedTrades,
}

/// Distribution summary of the resampled paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloSummary {
    pub n_paths: usize,
    pub n_trades: usize,
    pub return_mean: f64,
    pub return_median: f64,
    pub return_std: f64,
    pub return_p5: f64,
    pub return_p25: f64,
    pub return_p75: f64,
    pub return_p95: f64,
    /// Fraction of paths with a positive final return.
    pub prob_positive: f64,
    pub drawdown_mean: f64,
    pub drawdown_median: f64,
    pub drawdown_p95: f64,
}

/// Resample the run's closed-trade returns.
pub fn resample_run(
    result: &RunResult,
    config: &MonteCarloConfig,
) -> Result<MonteCarloSummary, MonteCarloError> {
    let returns: Vec<f64> = result
        .closed_sales()
        .filter_map(|t| t.realized_pnl_pct)
        .collect();
    resample_returns(&returns, config)
}

/// Resample an arbitrary per-trade return series.
pub fn resample_returns(
    trade_returns: &[f64],
    config: &MonteCarloConfig,
) -> Result<MonteCarloSummary, MonteCarloError> {
    if trade_returns.is_empty() {
        return Err(MonteCarloError::NoClosedTrades);
    }
    let n_trades = trade_returns.len();

    let paths: Vec<(f64, f64)> = (0..config.n_paths)
        .into_par_iter()
        .map(|path_index| {
            let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(path_index as u64));
            let mut equity = 1.0_f64;
            let mut peak = 1.0_f64;
            let mut max_dd = 0.0_f64;
            for _ in 0..n_trades {
                let r = trade_returns[rng.gen_range(0..n_trades)];
                equity *= 1.0 + r;
                peak = peak.max(equity);
                if peak > 0.0 {
                    max_dd = max_dd.max((peak - equity) / peak);
                }
            }
            (equity - 1.0, max_dd)
        })
        .collect();

    let mut final_returns: Vec<f64> = paths.iter().map(|(r, _)| *r).collect();
    let mut drawdowns: Vec<f64> = paths.iter().map(|(_, d)| *d).collect();
    final_returns.sort_by(f64::total_cmp);
    drawdowns.sort_by(f64::total_cmp);

    Ok(MonteCarloSummary {
        n_paths: config.n_paths,
        n_trades,
        return_mean: crate::metrics::mean(&final_returns),
        return_median: percentile(&final_returns, 50.0),
        return_std: crate::metrics::std_dev(&final_returns),
        return_p5: percentile(&final_returns, 5.0),
        return_p25: percentile(&final_returns, 25.0),
        return_p75: percentile(&final_returns, 75.0),
        return_p95: percentile(&final_returns, 95.0),
        prob_positive: final_returns.iter().filter(|&&r| r > 0.0).count() as f64
            / final_returns.len() as f64,
        drawdown_mean: crate::metrics::mean(&drawdowns),
        drawdown_median: percentile(&drawdowns, 50.0),
        drawdown_p95: percentile(&drawdowns, 95.0),
    })
}

/// Nearest-rank percentile of a sorted slice.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (pct / 100.0 * (sorted.len() - 1) as f64).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_trades_error() {
        let config = MonteCarloConfig::default();
        assert!(matches!(
            resample_returns(&[], &config),
            Err(MonteCarloError::NoClosedTrades)
        ));
    }

    #[test]
    fn all_positive_returns_guarantee_positive_paths() {
        let config = MonteCarloConfig {
            n_paths: 200,
            seed: 7,
        };
        let summary = resample_returns(&[0.05, 0.02, 0.08], &config).unwrap();
        assert_eq!(summary.prob_positive, 1.0);
        assert!(summary.return_p5 > 0.0);
        assert_eq!(summary.drawdown_p95, 0.0);
    }

    #[test]
    fn same_seed_same_summary() {
        let returns = [0.05, -0.03, 0.02, -0.01, 0.08];
        let config = MonteCarloConfig {
            n_paths: 500,
            seed: 99,
        };
        let a = resample_returns(&returns, &config).unwrap();
        let b = resample_returns(&returns, &config).unwrap();
        assert_eq!(a.return_mean, b.return_mean);
        assert_eq!(a.return_p5, b.return_p5);
        assert_eq!(a.drawdown_p95, b.drawdown_p95);
    }

    #[test]
    fn different_seeds_differ() {
        let returns = [0.05, -0.03, 0.02, -0.01, 0.08];
        let a = resample_returns(
            &returns,
            &MonteCarloConfig {
                n_paths: 500,
                seed: 1,
            },
        )
        .unwrap();
        let b = resample_returns(
            &returns,
            &MonteCarloConfig {
                n_paths: 500,
                seed: 2,
            },
        )
        .unwrap();
        assert_ne!(a.return_mean, b.return_mean);
    }

    #[test]
    fn percentiles_are_ordered() {
        let returns = [0.10, -0.08, 0.04, -0.02, 0.01, 0.06, -0.05];
        let summary =
            resample_returns(&returns, &MonteCarloConfig::default()).unwrap();
        assert!(summary.return_p5 <= summary.return_p25);
        assert!(summary.return_p25 <= summary.return_median);
        assert!(summary.return_median <= summary.return_p75);
        assert!(summary.return_p75 <= summary.return_p95);
        assert!(summary.drawdown_median <= summary.drawdown_p95);
    }
}
