//! Rolling mean and standard deviation for Bollinger bands.
//!
//! Upper/lower band assembly lives in the indicator engine; this module
//! only provides the trailing window arithmetic. StdDev is the sample
//! standard deviation (divides by N-1).
//!
//! Warmup: first (period-1) values are `None`.

/// Trailing simple moving average.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }
    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        out[i] = Some(window.iter().sum::<f64>() / period as f64);
    }
    out
}

/// Trailing sample standard deviation (ddof = 1).
pub fn rolling_std(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period < 2 || values.len() < period {
        return out;
    }
    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance =
            window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (period - 1) as f64;
        out[i] = Some(variance.sqrt());
    }
    out
}
