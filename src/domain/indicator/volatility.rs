//! Volatility helpers over closing prices.
//!
//! Population standard deviation divides by n, sample standard deviation by n-1.

use crate::domain::ohlcv::OhlcvBar;

/// (C[i] - C[i-1]) / C[i-1] for every bar after the first.
pub fn pct_changes(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.windows(2)
        .map(|w| (w[1].close - w[0].close) / w[0].close)
        .collect()
}

/// C[i] - C[i-1] for every bar after the first.
pub fn diffs(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.windows(2).map(|w| w[1].close - w[0].close).collect()
}

/// Last `n` values of a series (the whole series if shorter).
pub fn trailing(values: &[f64], n: usize) -> &[f64] {
    &values[values.len().saturating_sub(n)..]
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sum_sq_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum()
}

/// None for an empty slice.
pub fn population_std(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some((sum_sq_dev(values) / values.len() as f64).sqrt())
}

/// None for fewer than two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    Some((sum_sq_dev(values) / (values.len() - 1) as f64).sqrt())
}
