//! ashlab CLI — run backtests and validation passes from TOML configs.
//!
//! Commands:
//! - `run` — execute one backtest and export trade/equity/summary artifacts
//! - `walk-forward` — rolling out-of-sample validation
//! - `monte-carlo` — resample the run's closed trades

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ashlab_runner::{
    load_backtest_file, load_inputs, resample_run, run_single_backtest, run_walk_forward,
    save_artifacts, BacktestFile, BacktestReport, MonteCarloConfig,
};

#[derive(Parser)]
#[command(name = "ashlab", about = "ashlab — A-share backtesting engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to the TOML config.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        out: PathBuf,
    },
    /// Rolling walk-forward validation.
    WalkForward {
        #[arg(long)]
        config: PathBuf,

        /// Training window in bars.
        #[arg(long)]
        train: Option<usize>,

        /// Test window in bars.
        #[arg(long)]
        test: Option<usize>,

        /// Step between windows in bars.
        #[arg(long)]
        step: Option<usize>,
    },
    /// Monte Carlo resampling of closed-trade returns.
    MonteCarlo {
        #[arg(long)]
        config: PathBuf,

        /// Number of resampled paths.
        #[arg(long)]
        paths: Option<usize>,

        /// RNG seed.
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, out } => cmd_run(&config, &out),
        Commands::WalkForward {
            config,
            train,
            test,
            step,
        } => cmd_walk_forward(&config, train, test, step),
        Commands::MonteCarlo {
            config,
            paths,
            seed,
        } => cmd_monte_carlo(&config, paths, seed),
    }
}

fn run_configured(file: &BacktestFile) -> Result<BacktestReport> {
    let (data, mut strategy) = load_inputs(file).context("loading market data")?;
    let report =
        run_single_backtest(&data, strategy.as_mut(), &file.run).context("running backtest")?;
    Ok(report)
}

fn cmd_run(config_path: &PathBuf, out: &PathBuf) -> Result<()> {
    let file = load_backtest_file(config_path).context("loading config")?;
    let report = run_configured(&file)?;
    print_report(&report);
    save_artifacts(out, &report.result, &report.metrics)?;
    println!("\nartifacts: {}", out.display());
    Ok(())
}

fn cmd_walk_forward(
    config_path: &PathBuf,
    train: Option<usize>,
    test: Option<usize>,
    step: Option<usize>,
) -> Result<()> {
    let file = load_backtest_file(config_path).context("loading config")?;
    let (data, _) = load_inputs(&file).context("loading market data")?;

    let mut wf = file.walk_forward.clone();
    if let Some(train) = train {
        wf.train_bars = train;
    }
    if let Some(test) = test {
        wf.test_bars = test;
    }
    if let Some(step) = step {
        wf.step_bars = step;
    }

    let summary = run_walk_forward(&data, &file.run, &wf, || file.strategy.build())
        .context("walk-forward failed")?;

    println!("walk-forward: {} windows", summary.windows.len());
    for window in &summary.windows {
        println!(
            "  [{}] {} → {}  return {:+.2}%  sharpe {:.2}  max dd {:.2}%  trades {}{}",
            window.window_index,
            window.test_start,
            window.test_end,
            window.total_return * 100.0,
            window.sharpe,
            window.max_drawdown * 100.0,
            window.trade_count,
            if window.halted { "  [halted]" } else { "" },
        );
    }
    println!(
        "mean return {:+.2}%  (std {:.2}%)  positive {}/{}  mean sharpe {:.2}",
        summary.mean_return * 100.0,
        summary.std_return * 100.0,
        summary.positive_windows,
        summary.windows.len(),
        summary.mean_sharpe,
    );
    Ok(())
}

fn cmd_monte_carlo(
    config_path: &PathBuf,
    paths: Option<usize>,
    seed: Option<u64>,
) -> Result<()> {
    let file = load_backtest_file(config_path).context("loading config")?;
    let report = run_configured(&file)?;

    let mut mc: MonteCarloConfig = file.monte_carlo.clone();
    if let Some(paths) = paths {
        mc.n_paths = paths;
    }
    if let Some(seed) = seed {
        mc.seed = seed;
    }

    let summary = resample_run(&report.result, &mc).context("monte carlo failed")?;
    println!(
        "monte carlo: {} paths over {} closed trades",
        summary.n_paths, summary.n_trades
    );
    println!(
        "final return: mean {:+.2}%  median {:+.2}%  p5 {:+.2}%  p95 {:+.2}%",
        summary.return_mean * 100.0,
        summary.return_median * 100.0,
        summary.return_p5 * 100.0,
        summary.return_p95 * 100.0,
    );
    println!(
        "max drawdown: median {:.2}%  p95 {:.2}%   P(positive) {:.0}%",
        summary.drawdown_median * 100.0,
        summary.drawdown_p95 * 100.0,
        summary.prob_positive * 100.0,
    );
    Ok(())
}

fn print_report(report: &BacktestReport) {
    let m = &report.metrics;
    let r = &report.result;
    println!("final equity: {:.2}", r.final_equity);
    println!(
        "total return {:+.2}%  annual {:+.2}%  vol {:.2}%",
        m.total_return * 100.0,
        m.annual_return * 100.0,
        m.annual_volatility * 100.0,
    );
    println!(
        "sharpe {:.2}  sortino {:.2}  calmar {:.2}  max dd {:.2}% ({} bars)",
        m.sharpe, m.sortino, m.calmar, m.max_drawdown * 100.0, m.max_drawdown_duration,
    );
    println!(
        "trades: {} fills, {} rejected  win rate {:.0}%  profit factor {:.2}",
        r.fill_count,
        r.reject_count,
        m.win_rate * 100.0,
        m.profit_factor,
    );
    if let Some(bench) = &m.benchmark {
        println!(
            "vs benchmark: excess {:+.2}%  alpha {:+.2}%  beta {:.2}  IR {:.2}",
            bench.excess_return * 100.0,
            bench.alpha * 100.0,
            bench.beta,
            bench.information_ratio,
        );
    }
    if let Some(halt_date) = r.halt_date {
        println!("trading halted on {halt_date} (drawdown ceiling)");
    }
}
