//! Criterion benchmarks for hot paths: the bar loop and order execution.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::BTreeMap;

use ashlab_core::broker::SimBroker;
use ashlab_core::config::RunConfig;
use ashlab_core::domain::{Bar, Order};
use ashlab_core::engine::{run_backtest, MarketData};
use ashlab_core::signals::Momentum;
use chrono::NaiveDate;

fn make_bars(symbol: &str, n: usize) -> Vec<Bar> {
    let base_date = NaiveDate::from_ymd_opt(2018, 1, 2).unwrap();
    let mut prev_close = 100.0;
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0 + i as f64 * 0.01;
            let bar = Bar {
                symbol: symbol.into(),
                date: base_date + chrono::Duration::days(i as i64),
                open: close - 0.3,
                high: close + 1.5,
                low: close - 1.8,
                close,
                volume: 1_000_000 + (i as u64 % 500_000),
                prev_close,
                is_st: false,
            };
            prev_close = close;
            bar
        })
        .collect()
}

fn make_data(symbols: &[&str], n: usize) -> MarketData {
    let mut series = BTreeMap::new();
    for symbol in symbols {
        series.insert(symbol.to_string(), make_bars(symbol, n));
    }
    MarketData::new(series, make_bars("000300", n)).unwrap()
}

fn bench_bar_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("bar_loop");
    for n in [252usize, 1_260, 2_520] {
        let data = make_data(&["600519", "000001", "300750"], n);
        let config = RunConfig {
            initial_capital: 1_000_000.0,
            ..RunConfig::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let mut strategy = Momentum::default_params();
                let result = run_backtest(black_box(&data), &mut strategy, &config).unwrap();
                black_box(result.final_equity)
            });
        });
    }
    group.finish();
}

fn bench_order_execution(c: &mut Criterion) {
    let bars = make_bars("600519", 2);
    let config = RunConfig {
        initial_capital: 10_000_000.0,
        ..RunConfig::default()
    };
    c.bench_function("order_round_trip", |b| {
        b.iter(|| {
            let mut broker = SimBroker::new(&config);
            let buy = Order::signal_buy("600519", 100_000.0, bars[0].date);
            broker.execute(black_box(&buy), &bars[0]).unwrap();
            let position = broker.position("600519", bars[1].date).unwrap();
            let sell = Order::signal_sell("600519", position.sellable, bars[1].date);
            broker.execute(black_box(&sell), &bars[1]).unwrap();
            black_box(broker.cash())
        });
    });
}

criterion_group!(benches, bench_bar_loop, bench_order_execution);
criterion_main!(benches);
