//! Returns and dispersion measures.

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0.0 for fewer than two values.
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Simple per-step returns `(p[i] - p[i-1]) / p[i-1]`.
///
/// A step whose base price is zero contributes a return of 0.0.
pub fn pct_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .map(|w| if w[0] == 0.0 { 0.0 } else { (w[1] - w[0]) / w[0] })
        .collect()
}

/// Standard deviation of the last `period` values divided by their mean.
///
/// This is the volatility used to place stops and targets. Returns 0.0 when the
/// window mean is not positive.
pub fn coefficient_of_variation(values: &[f64], period: usize) -> f64 {
    if values.is_empty() || period == 0 {
        return 0.0;
    }
    let window = &values[values.len().saturating_sub(period)..];
    let m = mean(window);
    if m <= 0.0 {
        return 0.0;
    }
    population_std_dev(window) / m
}
