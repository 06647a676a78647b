//! MarketData — the immutable bar dataset shared across runs.
//!
//! Per-symbol series are aligned onto the union calendar at construction;
//! a symbol without a bar on a calendar date simply has no entry there.
//! Construction validates everything the engine later relies on —
//! malformed input aborts here, never mid-run, so a partial equity curve
//! is never reported as complete.

use crate::domain::Bar;
use crate::risk::RiskInputs;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;

/// Irrecoverable data problems — the whole run is aborted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("no symbol series supplied")]
    NoSymbols,

    #[error("empty bar series for {0}")]
    EmptySeries(String),

    #[error("non-monotonic bar dates for {symbol} at {date}")]
    NonMonotonicDates { symbol: String, date: NaiveDate },

    #[error("malformed bar for {symbol} at {date}")]
    InsaneBar { symbol: String, date: NaiveDate },

    #[error("missing benchmark series")]
    MissingBenchmark,
}

/// Immutable, read-only bar dataset: shared by reference across parallel
/// runs, never copied per run.
#[derive(Debug, Clone)]
pub struct MarketData {
    dates: Vec<NaiveDate>,
    symbols: Vec<String>,
    /// Aligned bars: `bars[symbol][t]` is the bar on `dates[t]`, if traded.
    bars: HashMap<String, Vec<Option<Bar>>>,
    /// Aligned close series with NaN holes, for indicator consumers.
    closes: HashMap<String, Vec<f64>>,
    /// Benchmark closes aligned to the calendar (carry-forward on gaps).
    benchmark: Vec<f64>,
    /// Externally computed volatility inputs per symbol, aligned.
    risk_inputs: HashMap<String, Vec<Option<RiskInputs>>>,
}

impl MarketData {
    /// Build from per-symbol chronological series and a benchmark series.
    pub fn new(
        series: BTreeMap<String, Vec<Bar>>,
        benchmark: Vec<Bar>,
    ) -> Result<Self, DataError> {
        if series.is_empty() {
            return Err(DataError::NoSymbols);
        }
        if benchmark.is_empty() {
            return Err(DataError::MissingBenchmark);
        }

        for (symbol, bars) in &series {
            if bars.is_empty() {
                return Err(DataError::EmptySeries(symbol.clone()));
            }
            validate_series(symbol, bars)?;
        }
        validate_series("benchmark", &benchmark)?;

        // Union calendar across all symbol series.
        let mut calendar: BTreeSet<NaiveDate> = BTreeSet::new();
        for bars in series.values() {
            calendar.extend(bars.iter().map(|b| b.date));
        }
        let dates: Vec<NaiveDate> = calendar.into_iter().collect();

        let symbols: Vec<String> = series.keys().cloned().collect();
        let mut bars_by_symbol: HashMap<String, Vec<Option<Bar>>> = HashMap::new();
        let mut closes_by_symbol: HashMap<String, Vec<f64>> = HashMap::new();
        for (symbol, bars) in series {
            let by_date: HashMap<NaiveDate, Bar> =
                bars.into_iter().map(|b| (b.date, b)).collect();
            let aligned: Vec<Option<Bar>> =
                dates.iter().map(|d| by_date.get(d).cloned()).collect();
            let closes: Vec<f64> = aligned
                .iter()
                .map(|b| b.as_ref().map(|b| b.close).unwrap_or(f64::NAN))
                .collect();
            bars_by_symbol.insert(symbol.clone(), aligned);
            closes_by_symbol.insert(symbol, closes);
        }

        // Benchmark aligned by carry-forward; leading gap uses first close.
        let bench_by_date: BTreeMap<NaiveDate, f64> =
            benchmark.iter().map(|b| (b.date, b.close)).collect();
        let first_close = *bench_by_date.values().next().expect("non-empty");
        let mut last = first_close;
        let benchmark_closes: Vec<f64> = dates
            .iter()
            .map(|d| {
                if let Some(&c) = bench_by_date.get(d) {
                    last = c;
                }
                last
            })
            .collect();

        Ok(Self {
            dates,
            symbols,
            bars: bars_by_symbol,
            closes: closes_by_symbol,
            benchmark: benchmark_closes,
            risk_inputs: HashMap::new(),
        })
    }

    /// Attach externally computed volatility inputs (aligned to the
    /// calendar) for the volatility stop.
    pub fn with_risk_inputs(
        mut self,
        inputs: HashMap<String, Vec<Option<RiskInputs>>>,
    ) -> Self {
        self.risk_inputs = inputs;
        self
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn num_bars(&self) -> usize {
        self.dates.len()
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn bar(&self, symbol: &str, t: usize) -> Option<&Bar> {
        self.bars.get(symbol)?.get(t)?.as_ref()
    }

    /// Aligned close series for a symbol (NaN where not traded).
    pub fn closes(&self, symbol: &str) -> Option<&[f64]> {
        self.closes.get(symbol).map(Vec::as_slice)
    }

    pub fn benchmark_closes(&self) -> &[f64] {
        &self.benchmark
    }

    pub fn risk_inputs(&self, symbol: &str, t: usize) -> Option<RiskInputs> {
        *self.risk_inputs.get(symbol)?.get(t)?
    }

    /// Index of the first calendar date >= `date`.
    pub fn index_at_or_after(&self, date: NaiveDate) -> usize {
        self.dates.partition_point(|d| *d < date)
    }

    /// Clone the `[start, end)` calendar window — walk-forward slicing.
    /// Indicator history restarts at the window edge, like any fresh run.
    pub fn slice(&self, start: usize, end: usize) -> MarketData {
        let end = end.min(self.dates.len());
        let start = start.min(end);
        MarketData {
            dates: self.dates[start..end].to_vec(),
            symbols: self.symbols.clone(),
            bars: self
                .bars
                .iter()
                .map(|(s, v)| (s.clone(), v[start..end].to_vec()))
                .collect(),
            closes: self
                .closes
                .iter()
                .map(|(s, v)| (s.clone(), v[start..end].to_vec()))
                .collect(),
            benchmark: self.benchmark[start..end].to_vec(),
            risk_inputs: self
                .risk_inputs
                .iter()
                .map(|(s, v)| (s.clone(), v[start..end].to_vec()))
                .collect(),
        }
    }
}

fn validate_series(symbol: &str, bars: &[Bar]) -> Result<(), DataError> {
    for window in bars.windows(2) {
        if window[1].date <= window[0].date {
            return Err(DataError::NonMonotonicDates {
                symbol: symbol.to_string(),
                date: window[1].date,
            });
        }
    }
    for bar in bars {
        if !bar.is_sane() {
            return Err(DataError::InsaneBar {
                symbol: symbol.to_string(),
                date: bar.date,
            });
        }
    }
    Ok(())
}
