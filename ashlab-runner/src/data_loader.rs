//! CSV bar ingestion — one file per symbol plus a benchmark file.
//!
//! Expected columns: `date,open,high,low,close,volume` with optional
//! `prev_close` and `is_st`. When `prev_close` is absent it is derived
//! from the prior row (the first bar gets 0.0, which disables the band
//! check there). Volatility inputs for the volatility stop are derived
//! here, upstream of the engine.

use ashlab_core::domain::Bar;
use ashlab_core::engine::{DataError, MarketData};
use ashlab_core::indicators::{rolling_volatility, sma};
use ashlab_core::risk::RiskInputs;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Data(#[from] DataError),
}

/// Loader knobs; the volatility windows feed the volatility stop.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub vol_period: usize,
    pub vol_baseline_period: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            vol_period: 20,
            vol_baseline_period: 60,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
    #[serde(default)]
    prev_close: Option<f64>,
    #[serde(default)]
    is_st: Option<bool>,
}

/// Load `<dir>/<symbol>.csv` for every symbol plus the benchmark file and
/// assemble a validated `MarketData` with volatility inputs attached.
pub fn load_market_data(
    dir: &Path,
    symbols: &[String],
    benchmark: &str,
    options: &LoadOptions,
) -> Result<MarketData, LoadError> {
    let mut series = BTreeMap::new();
    for symbol in symbols {
        let bars = load_symbol_csv(&dir.join(format!("{symbol}.csv")), symbol)?;
        log::info!("loaded {} bars for {symbol}", bars.len());
        series.insert(symbol.clone(), bars);
    }
    let benchmark_bars = load_symbol_csv(&dir.join(format!("{benchmark}.csv")), benchmark)?;
    log::info!("loaded {} benchmark bars ({benchmark})", benchmark_bars.len());

    let data = MarketData::new(series, benchmark_bars)?;
    let risk = derive_risk_inputs(&data, options);
    Ok(data.with_risk_inputs(risk))
}

/// Read one symbol's CSV into chronological bars.
pub fn load_symbol_csv(path: &Path, symbol: &str) -> Result<Vec<Bar>, LoadError> {
    let map_err = |source: csv::Error| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(map_err)?;

    let mut bars = Vec::new();
    let mut prior_close: Option<f64> = None;
    for row in reader.deserialize::<CsvRow>() {
        let row = row.map_err(map_err)?;
        bars.push(Bar {
            symbol: symbol.to_string(),
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
            prev_close: row.prev_close.or(prior_close).unwrap_or(0.0),
            is_st: row.is_st.unwrap_or(false),
        });
        prior_close = Some(row.close);
    }
    Ok(bars)
}

/// Realized volatility and its rolling baseline per symbol, aligned to the
/// calendar. Computed on each symbol's own traded days, then mapped back.
fn derive_risk_inputs(
    data: &MarketData,
    options: &LoadOptions,
) -> HashMap<String, Vec<Option<RiskInputs>>> {
    let mut result = HashMap::new();
    for symbol in data.symbols() {
        let Some(closes) = data.closes(symbol) else {
            continue;
        };

        // Compact to traded days; holes would poison the rolling windows.
        let traded: Vec<(usize, f64)> = closes
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_finite())
            .map(|(i, c)| (i, *c))
            .collect();
        let compact: Vec<f64> = traded.iter().map(|(_, c)| *c).collect();

        let vol = rolling_volatility(&compact, options.vol_period.max(2));
        let vol_start = options.vol_period.max(2);
        let mut aligned = vec![None; closes.len()];
        if compact.len() > vol_start {
            let baseline_part = sma(&vol[vol_start..], options.vol_baseline_period);
            for (compact_index, &(calendar_index, _)) in traded.iter().enumerate() {
                if compact_index < vol_start {
                    continue;
                }
                let realized = vol[compact_index];
                let baseline = baseline_part[compact_index - vol_start];
                if realized.is_finite() && baseline.is_finite() {
                    aligned[calendar_index] = Some(RiskInputs {
                        realized_vol: realized,
                        baseline_vol: baseline,
                    });
                }
            }
        }
        result.insert(symbol.clone(), aligned);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &Path, name: &str, rows: &[(u32, f64)]) {
        let mut file = std::fs::File::create(dir.join(format!("{name}.csv"))).unwrap();
        writeln!(file, "date,open,high,low,close,volume").unwrap();
        for (day, close) in rows {
            writeln!(
                file,
                "2024-03-{day:02},{:.2},{:.2},{:.2},{close:.2},10000",
                close - 0.5,
                close + 1.0,
                close - 1.0,
            )
            .unwrap();
        }
    }

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ashlab-loader-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn loads_and_derives_prev_close() {
        let dir = temp_dir("prev-close");
        write_csv(&dir, "600519", &[(1, 50.0), (4, 51.0), (5, 52.0)]);

        let bars = load_symbol_csv(&dir.join("600519.csv"), "600519").unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].prev_close, 0.0); // first bar: band check disabled
        assert_eq!(bars[1].prev_close, 50.0);
        assert_eq!(bars[2].prev_close, 51.0);
        assert!(!bars[0].is_st);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = temp_dir("missing");
        let err = load_symbol_csv(&dir.join("nope.csv"), "nope").unwrap_err();
        assert!(matches!(err, LoadError::Csv { .. }));
    }

    #[test]
    fn assembles_market_data_with_risk_inputs() {
        let dir = temp_dir("assemble");
        let rows: Vec<(u32, f64)> = (1..=28)
            .map(|day| (day, 50.0 + (day as f64 * 0.7).sin()))
            .collect();
        write_csv(&dir, "600519", &rows);
        write_csv(&dir, "000300", &rows);

        let data = load_market_data(
            &dir,
            &["600519".to_string()],
            "000300",
            &LoadOptions {
                vol_period: 5,
                vol_baseline_period: 10,
            },
        )
        .unwrap();

        assert_eq!(data.num_bars(), 28);
        // Warmup: no inputs early, present once vol + baseline both exist.
        assert!(data.risk_inputs("600519", 3).is_none());
        let late = data.risk_inputs("600519", 27);
        assert!(late.is_some());
        assert!(late.unwrap().baseline_vol > 0.0);
    }
}
