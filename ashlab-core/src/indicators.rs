//! Rolling indicator helpers used by the regime filter and example
//! strategies. Each returns a series aligned to the input with a NaN
//! warmup prefix; the value at index `i` only uses data up to `i`.

/// Simple moving average with a NaN prefix of `period - 1` values.
pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    assert!(period >= 1, "period must be >= 1");
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if n < period {
        return result;
    }

    let mut sum: f64 = values[..period].iter().sum();
    result[period - 1] = sum / period as f64;
    for i in period..n {
        sum += values[i] - values[i - period];
        result[i] = sum / period as f64;
    }
    result
}

/// Rate of change: `values[i] / values[i - period] - 1`.
pub fn roc(values: &[f64], period: usize) -> Vec<f64> {
    assert!(period >= 1, "period must be >= 1");
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    for i in period..n {
        let base = values[i - period];
        if base > 0.0 {
            result[i] = values[i] / base - 1.0;
        }
    }
    result
}

/// Annualized rolling volatility of simple returns over `period` bars
/// (sample standard deviation × √252).
pub fn rolling_volatility(closes: &[f64], period: usize) -> Vec<f64> {
    assert!(period >= 2, "period must be >= 2");
    let n = closes.len();
    let mut result = vec![f64::NAN; n];
    if n < 2 {
        return result;
    }

    let returns: Vec<f64> = closes
        .windows(2)
        .map(|w| if w[0] > 0.0 { w[1] / w[0] - 1.0 } else { f64::NAN })
        .collect();

    // returns[i] corresponds to the move into closes[i + 1]
    for i in period..n {
        let window = &returns[i - period..i];
        if window.iter().any(|r| r.is_nan()) {
            continue;
        }
        let mean = window.iter().sum::<f64>() / period as f64;
        let var = window.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (period - 1) as f64;
        result[i] = var.sqrt() * (252.0_f64).sqrt();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_basic() {
        let result = sma(&[10.0, 11.0, 12.0, 13.0, 14.0], 3);
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert!((result[2] - 11.0).abs() < 1e-12);
        assert!((result[3] - 12.0).abs() < 1e-12);
        assert!((result[4] - 13.0).abs() < 1e-12);
    }

    #[test]
    fn sma_period_one_is_identity() {
        let values = [100.0, 200.0, 300.0];
        assert_eq!(sma(&values, 1), values.to_vec());
    }

    #[test]
    fn sma_too_few_values_all_nan() {
        assert!(sma(&[1.0, 2.0], 5).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn roc_basic() {
        let result = roc(&[100.0, 110.0, 121.0], 1);
        assert!(result[0].is_nan());
        assert!((result[1] - 0.10).abs() < 1e-12);
        assert!((result[2] - 0.10).abs() < 1e-12);
    }

    #[test]
    fn rolling_volatility_constant_series_is_zero() {
        let closes = vec![100.0; 30];
        let vol = rolling_volatility(&closes, 20);
        assert!(vol[19].is_nan()); // not enough returns yet
        assert!((vol[20] - 0.0).abs() < 1e-12);
        assert!((vol[29] - 0.0).abs() < 1e-12);
    }

    #[test]
    fn rolling_volatility_positive_for_moving_series() {
        let closes: Vec<f64> = (0..40)
            .map(|i| 100.0 * (1.0 + 0.01 * ((i % 2) as f64)))
            .collect();
        let vol = rolling_volatility(&closes, 20);
        assert!(vol[39] > 0.0);
    }
}
